// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for stock-ledger
//!
//! Deterministic users, dates, clocks and databases shared by the
//! integration suites.
//!
//! # Design Principles
//! - All test data is deterministic (no `Uuid::now_v7()` or `Utc::now()`)
//! - Every suite gets a fresh migrated database
//! - Services are built with sequential ids and a fixed clock

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

use stock_ledger::clock::FixedClock;
use stock_ledger::ids::SequentialIdGenerator;
use stock_ledger::prices::StaticPriceSource;
use stock_ledger::{store, LedgerConfig, LedgerService};

// Fixed test users
pub const USER_ID_1: &str = "01934f4a-0001-7000-8000-000000000001";
pub const USER_ID_2: &str = "01934f4a-0002-7000-8000-000000000002";

// Fixed test timestamp (2023-10-11T09:00:00Z)
pub const FIXED_TIMESTAMP: &str = "2023-10-11T09:00:00Z";

pub const STOCK_ID: &str = "2330";

pub const INITIAL_BALANCE: Decimal = dec!(1000000);

/// Parse a fixed UUID from a constant string
pub fn parse_uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).expect("Invalid UUID in test fixture")
}

pub fn user_1() -> Uuid {
    parse_uuid(USER_ID_1)
}

pub fn user_2() -> Uuid {
    parse_uuid(USER_ID_2)
}

/// Parse the fixed timestamp
pub fn fixed_timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(FIXED_TIMESTAMP)
        .expect("Invalid timestamp in test fixture")
        .with_timezone(&Utc)
}

/// Exchange date in October 2023
pub fn trade_date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 10, day).expect("Invalid trade date in test fixture")
}

pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(fixed_timestamp()))
}

/// Fresh migrated in-memory database on a single pinned connection
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    store::migrate(&pool).await.expect("Failed to migrate");
    pool
}

/// File-backed WAL database with `max_connections` connections
///
/// The directory must outlive the pool.
pub async fn file_pool(max_connections: u32) -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!("sqlite://{}", dir.path().join("ledger.db").display());
    let config = LedgerConfig::new(url)
        .with_max_connections(max_connections)
        .with_busy_timeout(Duration::from_secs(10));
    let pool = store::connect(&config).await.expect("Failed to open file database");
    (dir, pool)
}

/// Service with sequential ids and `clock`
pub fn service_with(pool: SqlitePool, clock: Arc<FixedClock>, prices: StaticPriceSource) -> LedgerService {
    LedgerService::new(pool)
        .with_id_generator(Arc::new(SequentialIdGenerator::with_prefix(0xfeed)))
        .with_clock(clock)
        .with_price_source(Arc::new(prices))
}

/// Service over a fresh in-memory database with no market prices
pub async fn service() -> LedgerService {
    service_with(memory_pool().await, fixed_clock(), StaticPriceSource::new())
}

/// Service with `user_1` holding [`INITIAL_BALANCE`]
pub async fn funded_service() -> LedgerService {
    let service = service().await;
    service
        .open_account(user_1(), INITIAL_BALANCE)
        .await
        .expect("Failed to open account");
    service
}
