// Copyright (c) 2025 - Cowboy AI, Inc.
//! SQLite persistence for the ledger
//!
//! Connection setup, embedded migrations, and the snapshot loaders, savers
//! and read queries of each aggregate type.
//!
//! # Locking
//!
//! SQLite has no row locks. `load_for_update` issues a no-op `UPDATE` on
//! the snapshot row as its first statement, which takes the database write
//! lock and keeps it until the surrounding transaction ends. Concurrent
//! writers wait on the busy timeout instead of reading a stale row.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::config::LedgerConfig;
use crate::errors::{LedgerError, LedgerResult};

pub mod balance_history;
pub mod balance_view;
pub mod codec;
pub mod order;
pub mod transaction;

pub use balance_history::{BalanceHistoryEntry, BalanceHistoryProjector};
pub use balance_view::SqliteBalanceViewStore;
pub use order::{OrderFilter, SqliteOrderStore};
pub use transaction::SqliteTransactionStore;

/// Open a pool for `config` and bring the schema up to date
pub async fn connect(config: &LedgerConfig) -> LedgerResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .map_err(|e| LedgerError::Configuration(format!("database url: {e}")))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(config.busy_timeout)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
        .map_err(|e| LedgerError::transaction("connect", e))?;

    info!(url = %config.database_url, max_connections = config.max_connections, "connected to ledger store");

    migrate(&pool).await?;
    Ok(pool)
}

/// Apply the embedded migrations
pub async fn migrate(pool: &SqlitePool) -> LedgerResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("ledger schema is up to date");
    Ok(())
}
