// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event Store Abstraction
//!
//! Per-aggregate-type append-only log of domain events.
//!
//! # Architecture
//!
//! ```text
//! Aggregate ──uncommitted events──▶ EventStore::append ──▶ <aggregate>_events
//!                                                              │
//! Aggregate ◀──────apply────────── EventStore::load ◀─────────┘
//! ```
//!
//! # Event Store Requirements
//!
//! 1. **Append-Only**: events are never updated or deleted
//! 2. **Ordered**: `(aggregate_id, version)` is the primary key
//! 3. **Optimistic Concurrency**: a second writer of the same version loses
//!    with `EventVersionConflict`; there is no automatic retry
//! 4. **Atomic Batches**: a batch is appended in one (nested) transaction
//!
//! # Transactions
//!
//! Every method takes the caller's connection. When the caller is already
//! inside a transaction the store works inside a savepoint, so the append
//! commits or rolls back with the caller's unit of work.

use async_trait::async_trait;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::errors::LedgerResult;
use crate::events::{DomainEvent, Event};

pub mod sqlite;

pub use sqlite::SqliteEventStore;

/// Event Store trait for persisting and retrieving one aggregate type's events
#[async_trait]
pub trait EventStore<E: DomainEvent>: Send + Sync {
    /// Read events of an aggregate starting at a version
    ///
    /// # Arguments
    ///
    /// * `aggregate_id` - The aggregate to read events for
    /// * `from_version` - First version to return (inclusive)
    ///
    /// # Returns
    ///
    /// Events in ascending version order
    ///
    /// # Errors
    ///
    /// - `EventNotRegistered` for a stored tag the registry does not know
    /// - `EventUnmarshal` for a payload that does not decode
    async fn load(
        &self,
        conn: &mut SqliteConnection,
        aggregate_id: Uuid,
        from_version: u64,
    ) -> LedgerResult<Vec<Event<E>>>;

    /// Append events atomically
    ///
    /// # Errors
    ///
    /// - `EventVersionConflict` when a version already exists
    /// - `EventMarshal` when a payload cannot be encoded
    /// - `Transaction` for any other store failure
    async fn append(&self, conn: &mut SqliteConnection, events: &[Event<E>]) -> LedgerResult<()>;

    /// Highest stored version, 0 for an unknown aggregate
    async fn current_version(
        &self,
        conn: &mut SqliteConnection,
        aggregate_id: Uuid,
    ) -> LedgerResult<u64>;

    /// Take the store's write lock for the rest of the caller's transaction
    async fn lock(&self, conn: &mut SqliteConnection, aggregate_id: Uuid) -> LedgerResult<()>;
}
