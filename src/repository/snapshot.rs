// Copyright (c) 2025 - Cowboy AI, Inc.
//! Snapshot fast path
//!
//! A loader reads an aggregate from its materialized row instead of
//! replaying the event log; a saver writes that row after each save. Both
//! are typed by the aggregate, so a loader can only ever produce the
//! aggregate type its repository manages.

use async_trait::async_trait;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::aggregate::Aggregate;
use crate::errors::LedgerResult;

#[async_trait]
pub trait SnapshotLoader<A: Aggregate>: Send + Sync {
    /// Read the current snapshot
    ///
    /// # Errors
    ///
    /// `AggregateNotFound` when no row exists.
    async fn load(&self, conn: &mut SqliteConnection, id: Uuid) -> LedgerResult<A>;

    /// Read the snapshot holding the write lock until the caller's
    /// transaction ends
    async fn load_for_update(&self, conn: &mut SqliteConnection, id: Uuid) -> LedgerResult<A>;
}

#[async_trait]
pub trait SnapshotSaver<A: Aggregate>: Send + Sync {
    /// Insert or replace the snapshot row with the aggregate's current state
    async fn save(&self, conn: &mut SqliteConnection, aggregate: &A) -> LedgerResult<()>;
}
