// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event-sourced back-office ledger for stock trading
//!
//! Orders, cash transactions and per-user balances are aggregates whose
//! every state change is an immutable event. Events are appended to a
//! per-type log with optimistic concurrency, mirrored into snapshot rows
//! for fast reads, and fanned out to projectors, all inside one SQLite
//! transaction.
//!
//! ```text
//! LedgerService ─▶ Aggregate::record ─▶ StateMachine transition check
//!       │
//!       └─▶ AggregateRepository::save ─▶ EventStore::append
//!                                     ├─▶ SnapshotSaver::save
//!                                     └─▶ Projector::project
//! ```

pub mod aggregate;
pub mod clock;
pub mod config;
pub mod domain;
pub mod errors;
pub mod event_store;
pub mod events;
pub mod ids;
pub mod prices;
pub mod projection;
pub mod repository;
pub mod service;
pub mod state_machine;
pub mod store;
pub mod telemetry;

// Re-export commonly used types
pub use aggregate::{Aggregate, BalanceView, Order, Transaction};
pub use config::LedgerConfig;
pub use domain::{OrderSide, OrderType};
pub use errors::{LedgerError, LedgerResult};
pub use event_store::{EventStore, SqliteEventStore};
pub use events::{DomainEvent, Event, EventRegistry, EventType};
pub use repository::AggregateRepository;
pub use service::{CreateOrderRequest, LedgerService};
pub use state_machine::StateMachine;
pub use store::OrderFilter;
