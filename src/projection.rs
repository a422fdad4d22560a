// Copyright (c) 2025 - Cowboy AI, Inc.

//! Projectors - side effects fanned out from saved events
//!
//! A projector maps one event type to a read-model update. The repository
//! calls every projector registered for an event's tag after the event is
//! appended and the snapshot written, inside the same transaction:
//!
//! ```text
//! save(aggregate)
//!   ├─ append events        ─┐
//!   ├─ save snapshot         ├─ one transaction
//!   └─ project each event   ─┘
//! ```
//!
//! A failing projector therefore rolls back the append and the snapshot as
//! well. Projectors must only touch their own read-model tables.
//!
//! # Example Implementation
//!
//! ```rust,ignore
//! struct AuditTrail;
//!
//! #[async_trait]
//! impl Projector<BalanceView> for AuditTrail {
//!     async fn project(
//!         &self,
//!         conn: &mut SqliteConnection,
//!         view: &BalanceView,
//!         event: &Event<BalanceEvent>,
//!     ) -> LedgerResult<()> {
//!         sqlx::query("INSERT INTO audit (user_id, version) VALUES (?, ?)")
//!             .bind(view.id())
//!             .bind(encode_unsigned("version", event.version)?)
//!             .execute(conn)
//!             .await
//!             .map_err(|e| LedgerError::transaction("audit", e))?;
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "audit-trail"
//!     }
//! }
//! ```

use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::aggregate::Aggregate;
use crate::errors::LedgerResult;
use crate::events::Event;

/// Read-model update for events of aggregate type `A`
#[async_trait]
pub trait Projector<A: Aggregate>: Send + Sync {
    /// Project one saved event
    ///
    /// `aggregate` is the state after all events of the save were applied.
    async fn project(
        &self,
        conn: &mut SqliteConnection,
        aggregate: &A,
        event: &Event<A::Event>,
    ) -> LedgerResult<()>;

    /// Name used in logs
    fn name(&self) -> &str;
}
