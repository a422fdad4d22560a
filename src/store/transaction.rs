// Copyright (c) 2025 - Cowboy AI, Inc.
//! Transaction snapshots and queries

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::codec::{
    self, decimal_column, encode_timestamp, encode_unsigned, timestamp_column, unsigned_column,
};
use crate::aggregate::{Aggregate, Transaction};
use crate::errors::{LedgerError, LedgerResult};
use crate::repository::{SnapshotLoader, SnapshotSaver};

const TRANSACTION_COLUMNS: &str = "id, user_id, order_id, order_type, credit_amount, debit_amount, \
     status, version, created_at, updated_at";

#[derive(Debug, Clone, Default)]
pub struct SqliteTransactionStore;

impl SqliteTransactionStore {
    pub fn new() -> Self {
        Self
    }

    /// Transactions of `user_id` created in `[start, end)`, newest first
    pub async fn list_transactions(
        &self,
        conn: &mut SqliteConnection,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> LedgerResult<Vec<Transaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             WHERE user_id = ? AND created_at >= ? AND created_at < ? \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(encode_timestamp(start))
            .bind(encode_timestamp(end))
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| LedgerError::transaction("list transactions", e))?;

        rows.iter().map(transaction_from_row).collect()
    }

    /// Transactions posted for one order, in posting order
    pub async fn list_for_order(
        &self,
        conn: &mut SqliteConnection,
        order_id: Uuid,
    ) -> LedgerResult<Vec<Transaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE order_id = ? \
             ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(order_id)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| LedgerError::transaction("list order transactions", e))?;

        rows.iter().map(transaction_from_row).collect()
    }

    async fn fetch(&self, conn: &mut SqliteConnection, id: Uuid) -> LedgerResult<Transaction> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| LedgerError::transaction("load transaction", e))?
            .ok_or(LedgerError::AggregateNotFound(id))?;
        transaction_from_row(&row)
    }
}

#[async_trait]
impl SnapshotLoader<Transaction> for SqliteTransactionStore {
    async fn load(&self, conn: &mut SqliteConnection, id: Uuid) -> LedgerResult<Transaction> {
        self.fetch(conn, id).await
    }

    async fn load_for_update(&self, conn: &mut SqliteConnection, id: Uuid) -> LedgerResult<Transaction> {
        sqlx::query("UPDATE transactions SET version = version WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(|e| LedgerError::transaction("lock transaction", e))?;
        self.fetch(conn, id).await
    }
}

#[async_trait]
impl SnapshotSaver<Transaction> for SqliteTransactionStore {
    async fn save(&self, conn: &mut SqliteConnection, transaction: &Transaction) -> LedgerResult<()> {
        let created_at = transaction.created_at.or(transaction.updated_at).unwrap_or_default();
        let updated_at = transaction.updated_at.unwrap_or(created_at);

        sqlx::query(
            "INSERT INTO transactions (id, user_id, order_id, order_type, credit_amount, debit_amount, \
             status, version, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET \
             status = excluded.status, version = excluded.version, updated_at = excluded.updated_at",
        )
        .bind(transaction.id())
        .bind(transaction.user_id)
        .bind(transaction.order_id)
        .bind(transaction.order_type.as_str())
        .bind(transaction.credit_amount.to_string())
        .bind(transaction.debit_amount.to_string())
        .bind(transaction.status.as_str())
        .bind(encode_unsigned("version", transaction.version())?)
        .bind(encode_timestamp(created_at))
        .bind(encode_timestamp(updated_at))
        .execute(&mut *conn)
        .await
        .map_err(|e| LedgerError::transaction("save transaction snapshot", e))?;
        Ok(())
    }
}

fn transaction_from_row(row: &SqliteRow) -> LedgerResult<Transaction> {
    let order_type: String = codec::column(row, "order_type")?;
    let status: String = codec::column(row, "status")?;
    Ok(Transaction::restore(
        codec::column(row, "id")?,
        unsigned_column(row, "version")?,
        codec::column(row, "user_id")?,
        codec::column(row, "order_id")?,
        order_type.parse()?,
        decimal_column(row, "credit_amount")?,
        decimal_column(row, "debit_amount")?,
        status.parse()?,
        timestamp_column(row, "created_at")?,
        timestamp_column(row, "updated_at")?,
    ))
}
