// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Layer for the Ledger
//!
//! Use cases over the aggregate repositories, each one a single store
//! transaction.
//!
//! # Architecture
//!
//! ```text
//! Client Request
//!     ↓
//! LedgerService (this module)
//!     ↓
//! Aggregate → Event
//!     ↓
//! AggregateRepository ── event log + snapshot + projections (SQLite)
//! ```
//!
//! # Design Principles
//!
//! 1. **Transaction Boundaries**: each use case owns exactly one transaction
//! 2. **Lock First**: writers lock the user's balance before reading anything
//! 3. **Command/Query Separation**: queries never open a write transaction
//! 4. **Bounded**: every command runs under the configured deadline
//!
//! # Example
//!
//! ```rust,ignore
//! use stock_ledger::service::{CreateOrderRequest, LedgerService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = LedgerService::connect(&LedgerConfig::from_env()?).await?;
//!
//!     service.open_account(user_id, dec!(1_000_000)).await?;
//!     service
//!         .create_order(CreateOrderRequest::buy(user_id, "2330", dec!(84.9), 2, today))
//!         .await?;
//!
//!     let balance = service.get_balance_view(user_id).await?;
//!     Ok(())
//! }
//! ```

pub mod ledger;
pub mod requests;

pub use ledger::LedgerService;
pub use requests::CreateOrderRequest;
