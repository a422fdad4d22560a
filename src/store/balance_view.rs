// Copyright (c) 2025 - Cowboy AI, Inc.
//! BalanceView snapshots

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::codec::{
    self, decimal_column, encode_timestamp, encode_unsigned, timestamp_column, unsigned_column,
};
use crate::aggregate::{Aggregate, BalanceView};
use crate::errors::{LedgerError, LedgerResult};
use crate::repository::{SnapshotLoader, SnapshotSaver};

const BALANCE_COLUMNS: &str =
    "id, balance, available, pending, currency, status, version, created_at, updated_at";

#[derive(Debug, Clone, Default)]
pub struct SqliteBalanceViewStore;

impl SqliteBalanceViewStore {
    pub fn new() -> Self {
        Self
    }

    async fn fetch(&self, conn: &mut SqliteConnection, id: Uuid) -> LedgerResult<BalanceView> {
        let sql = format!("SELECT {BALANCE_COLUMNS} FROM balance_views WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| LedgerError::transaction("load balance view", e))?
            .ok_or(LedgerError::AggregateNotFound(id))?;
        balance_from_row(&row)
    }
}

#[async_trait]
impl SnapshotLoader<BalanceView> for SqliteBalanceViewStore {
    async fn load(&self, conn: &mut SqliteConnection, id: Uuid) -> LedgerResult<BalanceView> {
        self.fetch(conn, id).await
    }

    async fn load_for_update(&self, conn: &mut SqliteConnection, id: Uuid) -> LedgerResult<BalanceView> {
        sqlx::query("UPDATE balance_views SET version = version WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(|e| LedgerError::transaction("lock balance view", e))?;
        self.fetch(conn, id).await
    }
}

#[async_trait]
impl SnapshotSaver<BalanceView> for SqliteBalanceViewStore {
    async fn save(&self, conn: &mut SqliteConnection, view: &BalanceView) -> LedgerResult<()> {
        let created_at = view.created_at.or(view.updated_at).unwrap_or_default();
        let updated_at = view.updated_at.unwrap_or(created_at);

        sqlx::query(
            "INSERT INTO balance_views (id, balance, available, pending, currency, status, version, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET \
             balance = excluded.balance, available = excluded.available, pending = excluded.pending, \
             status = excluded.status, version = excluded.version, updated_at = excluded.updated_at",
        )
        .bind(view.id())
        .bind(view.balance.to_string())
        .bind(view.available.to_string())
        .bind(view.pending.to_string())
        .bind(view.currency.as_str())
        .bind(view.status.as_str())
        .bind(encode_unsigned("version", view.version())?)
        .bind(encode_timestamp(created_at))
        .bind(encode_timestamp(updated_at))
        .execute(&mut *conn)
        .await
        .map_err(|e| LedgerError::transaction("save balance view snapshot", e))?;
        Ok(())
    }
}

fn balance_from_row(row: &SqliteRow) -> LedgerResult<BalanceView> {
    let status: String = codec::column(row, "status")?;
    Ok(BalanceView::restore(
        codec::column(row, "id")?,
        unsigned_column(row, "version")?,
        decimal_column(row, "balance")?,
        decimal_column(row, "available")?,
        decimal_column(row, "pending")?,
        codec::column(row, "currency")?,
        status.parse()?,
        timestamp_column(row, "created_at")?,
        timestamp_column(row, "updated_at")?,
    ))
}
