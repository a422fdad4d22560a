// Copyright (c) 2025 - Cowboy AI, Inc.
//! Order snapshots and queries

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

use super::codec::{
    self, decimal_column, encode_date, encode_timestamp, encode_unsigned, optional_date_column,
    timestamp_column, unsigned_column,
};
use crate::aggregate::{Aggregate, Order};
use crate::domain::OrderSide;
use crate::errors::{LedgerError, LedgerResult};
use crate::repository::{SnapshotLoader, SnapshotSaver};
use crate::state_machine::OrderState;

const ORDER_COLUMNS: &str = "id, user_id, stock_id, buy_price, buy_quantity, buy_date, \
     sell_price, sell_quantity, sell_date, profitable_price, status, version, created_at, updated_at";

/// Criteria for listing a user's orders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub user_id: Uuid,
    /// Restrict to these symbols; empty means all
    pub stock_ids: Vec<String>,
    pub status: Option<OrderState>,
    /// `YYYYMM`; matches orders with a fill on either side in that month
    pub exchange_month: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl OrderFilter {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }

    pub fn with_stock_ids(mut self, stock_ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.stock_ids = stock_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_status(mut self, status: OrderState) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_exchange_month(mut self, month: impl Into<String>) -> Self {
        self.exchange_month = Some(month.into());
        self
    }

    pub fn with_page(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    fn validate(&self) -> LedgerResult<()> {
        if let Some(month) = &self.exchange_month {
            if month.len() != 6 || !month.chars().all(|c| c.is_ascii_digit()) {
                return Err(LedgerError::InvalidRequest(format!(
                    "exchange month must be YYYYMM, got {month:?}"
                )));
            }
        }
        Ok(())
    }
}

/// Snapshot loader, saver and queries over the `orders` table
#[derive(Debug, Clone, Default)]
pub struct SqliteOrderStore;

impl SqliteOrderStore {
    pub fn new() -> Self {
        Self
    }

    /// Orders matching `filter`, newest first
    pub async fn list_orders(
        &self,
        conn: &mut SqliteConnection,
        filter: &OrderFilter,
    ) -> LedgerResult<Vec<Order>> {
        filter.validate()?;

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = "
        ));
        query.push_bind(filter.user_id);

        if !filter.stock_ids.is_empty() {
            query.push(" AND stock_id IN (");
            let mut ids = query.separated(", ");
            for stock_id in &filter.stock_ids {
                ids.push_bind(stock_id.clone());
            }
            ids.push_unseparated(")");
        }

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }

        if let Some(month) = &filter.exchange_month {
            let pattern = format!("{month}%");
            query
                .push(" AND (buy_date LIKE ")
                .push_bind(pattern.clone())
                .push(" OR sell_date LIKE ")
                .push_bind(pattern)
                .push(")");
        }

        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(filter.limit.map(i64::from).unwrap_or(-1))
            .push(" OFFSET ")
            .push_bind(i64::from(filter.offset.unwrap_or(0)));

        let rows = query
            .build()
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| LedgerError::transaction("list orders", e))?;

        rows.iter().map(order_from_row).collect()
    }

    /// Open orders of `user_id` on `stock_id` that a fill on `side` can
    /// match, oldest first
    pub async fn list_open_orders(
        &self,
        conn: &mut SqliteConnection,
        user_id: Uuid,
        stock_id: &str,
        side: OrderSide,
    ) -> LedgerResult<Vec<Order>> {
        // Orders still holding shares on the opposite side
        let held = quantity_column(side.opposite());
        let filled = quantity_column(side);
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE user_id = ? AND stock_id = ? AND status IN (?, ?) AND {held} - {filled} > 0 \
             ORDER BY created_at ASC, id ASC"
        );

        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(stock_id)
            .bind(OrderState::Created.as_str())
            .bind(OrderState::Changed.as_str())
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| LedgerError::transaction("list open orders", e))?;

        rows.iter().map(order_from_row).collect()
    }

    async fn fetch(&self, conn: &mut SqliteConnection, id: Uuid) -> LedgerResult<Order> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| LedgerError::transaction("load order", e))?
            .ok_or(LedgerError::AggregateNotFound(id))?;
        order_from_row(&row)
    }
}

#[async_trait]
impl SnapshotLoader<Order> for SqliteOrderStore {
    async fn load(&self, conn: &mut SqliteConnection, id: Uuid) -> LedgerResult<Order> {
        self.fetch(conn, id).await
    }

    async fn load_for_update(&self, conn: &mut SqliteConnection, id: Uuid) -> LedgerResult<Order> {
        sqlx::query("UPDATE orders SET version = version WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(|e| LedgerError::transaction("lock order", e))?;
        self.fetch(conn, id).await
    }
}

#[async_trait]
impl SnapshotSaver<Order> for SqliteOrderStore {
    async fn save(&self, conn: &mut SqliteConnection, order: &Order) -> LedgerResult<()> {
        let created_at = order.created_at.or(order.updated_at).unwrap_or_default();
        let updated_at = order.updated_at.unwrap_or(created_at);

        sqlx::query(
            "INSERT INTO orders (id, user_id, stock_id, buy_price, buy_quantity, buy_date, \
             sell_price, sell_quantity, sell_date, profitable_price, status, version, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET \
             buy_price = excluded.buy_price, buy_quantity = excluded.buy_quantity, buy_date = excluded.buy_date, \
             sell_price = excluded.sell_price, sell_quantity = excluded.sell_quantity, sell_date = excluded.sell_date, \
             status = excluded.status, version = excluded.version, updated_at = excluded.updated_at",
        )
        .bind(order.id())
        .bind(order.user_id)
        .bind(order.stock_id.as_str())
        .bind(order.buy_price.to_string())
        .bind(encode_unsigned("buy_quantity", order.buy_quantity)?)
        .bind(order.buy_date.map(encode_date))
        .bind(order.sell_price.to_string())
        .bind(encode_unsigned("sell_quantity", order.sell_quantity)?)
        .bind(order.sell_date.map(encode_date))
        .bind(order.profitable_price.to_string())
        .bind(order.status.as_str())
        .bind(encode_unsigned("version", order.version())?)
        .bind(encode_timestamp(created_at))
        .bind(encode_timestamp(updated_at))
        .execute(&mut *conn)
        .await
        .map_err(|e| LedgerError::transaction("save order snapshot", e))?;
        Ok(())
    }
}

fn quantity_column(side: OrderSide) -> &'static str {
    match side {
        OrderSide::Buy => "buy_quantity",
        OrderSide::Sell => "sell_quantity",
    }
}

fn order_from_row(row: &SqliteRow) -> LedgerResult<Order> {
    let status: String = codec::column(row, "status")?;
    Ok(Order::restore(
        codec::column(row, "id")?,
        unsigned_column(row, "version")?,
        codec::column(row, "user_id")?,
        codec::column(row, "stock_id")?,
        (
            decimal_column(row, "buy_price")?,
            unsigned_column(row, "buy_quantity")?,
            optional_date_column(row, "buy_date")?,
        ),
        (
            decimal_column(row, "sell_price")?,
            unsigned_column(row, "sell_quantity")?,
            optional_date_column(row, "sell_date")?,
        ),
        decimal_column(row, "profitable_price")?,
        status.parse()?,
        timestamp_column(row, "created_at")?,
        timestamp_column(row, "updated_at")?,
    ))
}
