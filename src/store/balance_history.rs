// Copyright (c) 2025 - Cowboy AI, Inc.
//! Balance history read model
//!
//! One row per `balance.changed` event, written by
//! [`BalanceHistoryProjector`] inside the balance save.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::codec::{
    self, decimal_column, encode_timestamp, encode_unsigned, timestamp_column, unsigned_column,
};
use crate::aggregate::{Aggregate, BalanceView};
use crate::domain::OrderType;
use crate::errors::{LedgerError, LedgerResult};
use crate::events::{BalanceEvent, Event};
use crate::projection::Projector;

/// One bucket movement of a user's balance
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceHistoryEntry {
    pub user_id: Uuid,
    pub version: u64,
    pub transaction_id: Uuid,
    pub order_type: OrderType,
    pub amount: Decimal,
    pub available_delta: Decimal,
    pub pending_delta: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct BalanceHistoryProjector;

impl BalanceHistoryProjector {
    pub fn new() -> Self {
        Self
    }

    /// History of `user_id`, oldest first
    pub async fn list(
        &self,
        conn: &mut SqliteConnection,
        user_id: Uuid,
    ) -> LedgerResult<Vec<BalanceHistoryEntry>> {
        let rows = sqlx::query(
            "SELECT user_id, version, transaction_id, order_type, amount, available_delta, \
             pending_delta, currency, created_at \
             FROM balance_history WHERE user_id = ? ORDER BY version ASC",
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| LedgerError::transaction("list balance history", e))?;

        rows.iter().map(entry_from_row).collect()
    }
}

#[async_trait]
impl Projector<BalanceView> for BalanceHistoryProjector {
    async fn project(
        &self,
        conn: &mut SqliteConnection,
        view: &BalanceView,
        event: &Event<BalanceEvent>,
    ) -> LedgerResult<()> {
        let BalanceEvent::Changed(changed) = &event.payload else {
            return Ok(());
        };

        sqlx::query(
            "INSERT INTO balance_history (user_id, version, transaction_id, order_type, amount, \
             available_delta, pending_delta, currency, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(view.id())
        .bind(encode_unsigned("version", event.version)?)
        .bind(changed.transaction_id)
        .bind(changed.order_type.as_str())
        .bind(changed.amount.to_string())
        .bind(changed.available_delta.to_string())
        .bind(changed.pending_delta.to_string())
        .bind(changed.currency.as_str())
        .bind(encode_timestamp(event.created_at))
        .execute(&mut *conn)
        .await
        .map_err(|e| LedgerError::transaction("project balance history", e))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "balance-history"
    }
}

fn entry_from_row(row: &SqliteRow) -> LedgerResult<BalanceHistoryEntry> {
    let order_type: String = codec::column(row, "order_type")?;
    Ok(BalanceHistoryEntry {
        user_id: codec::column(row, "user_id")?,
        version: unsigned_column(row, "version")?,
        transaction_id: codec::column(row, "transaction_id")?,
        order_type: order_type.parse()?,
        amount: decimal_column(row, "amount")?,
        available_delta: decimal_column(row, "available_delta")?,
        pending_delta: decimal_column(row, "pending_delta")?,
        currency: codec::column(row, "currency")?,
        created_at: timestamp_column(row, "created_at")?,
    })
}
