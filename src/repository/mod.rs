// Copyright (c) 2025 - Cowboy AI, Inc.
//! Aggregate Repository
//!
//! Load and save for one aggregate type, combining the event log with an
//! optional snapshot row:
//!
//! ```text
//! load(id)
//!   ├─ loader configured ──▶ SnapshotLoader::load            (one row read)
//!   └─ otherwise         ──▶ EventStore::load(id, 1) + apply (full replay)
//!
//! save(aggregate)                              ── one transaction ──
//!   1. EventStore::append(uncommitted events)     always, audit trail
//!   2. SnapshotSaver::save(aggregate)             if configured
//!   3. Projector::project(event) per registered event type
//! ```
//!
//! Any failing step rolls back the whole save and leaves the aggregate's
//! uncommitted events in place. A successful save clears them.
//!
//! # Locking
//!
//! [`AggregateRepository::load_for_update`] is the load to use before any
//! mutation. It takes the store's write lock first and holds it until the
//! caller's transaction ends, so two writers of the same aggregate are
//! serialized instead of racing on the event version.

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::{Connection, SqliteConnection};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::aggregate::Aggregate;
use crate::errors::{LedgerError, LedgerResult};
use crate::event_store::{EventStore, SqliteEventStore};
use crate::events::{DomainEvent, EventRegistry, EventType};
use crate::projection::Projector;

pub mod snapshot;

pub use snapshot::{SnapshotLoader, SnapshotSaver};

/// Repository of aggregate type `A`
pub struct AggregateRepository<A: Aggregate> {
    store: Arc<dyn EventStore<A::Event>>,
    loader: Option<Arc<dyn SnapshotLoader<A>>>,
    saver: Option<Arc<dyn SnapshotSaver<A>>>,
    projectors: HashMap<EventType, Vec<Arc<dyn Projector<A>>>>,
}

impl<A: Aggregate> AggregateRepository<A> {
    /// Repository over an explicit event store
    pub fn new(store: Arc<dyn EventStore<A::Event>>) -> Self {
        Self {
            store,
            loader: None,
            saver: None,
            projectors: HashMap::new(),
        }
    }

    /// Replay-only repository over `A::EVENT_TABLE`
    pub fn sqlite() -> Self {
        let registry = EventRegistry::<A::Event>::from_state_machine::<A>();
        Self::new(Arc::new(SqliteEventStore::new(A::EVENT_TABLE, registry)))
    }

    pub fn with_loader(mut self, loader: Arc<dyn SnapshotLoader<A>>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn with_saver(mut self, saver: Arc<dyn SnapshotSaver<A>>) -> Self {
        self.saver = Some(saver);
        self
    }

    /// Register a projector for one event type
    pub fn add_projector(&mut self, event_type: EventType, projector: Arc<dyn Projector<A>>) {
        self.projectors.entry(event_type).or_default().push(projector);
    }

    pub fn with_projector(mut self, event_type: EventType, projector: Arc<dyn Projector<A>>) -> Self {
        self.add_projector(event_type, projector);
        self
    }

    pub fn event_store(&self) -> &Arc<dyn EventStore<A::Event>> {
        &self.store
    }

    /// Current state of an aggregate
    ///
    /// # Errors
    ///
    /// - `AggregateNotFound` when there is no snapshot or no event
    /// - `Loader` when the snapshot read fails
    /// - `ApplyEvent` when a stored event cannot be replayed
    #[instrument(skip(self, conn), fields(table = A::EVENT_TABLE))]
    pub async fn load(&self, conn: &mut SqliteConnection, id: Uuid) -> LedgerResult<A> {
        match &self.loader {
            Some(loader) => loader
                .load(conn, id)
                .await
                .map_err(|e| LedgerError::loader(id, e)),
            None => self.replay(conn, id).await,
        }
    }

    /// Current state with the write lock held to the end of the caller's
    /// transaction
    #[instrument(skip(self, conn), fields(table = A::EVENT_TABLE))]
    pub async fn load_for_update(&self, conn: &mut SqliteConnection, id: Uuid) -> LedgerResult<A> {
        match &self.loader {
            Some(loader) => loader
                .load_for_update(conn, id)
                .await
                .map_err(|e| LedgerError::loader(id, e)),
            None => {
                self.store.lock(conn, id).await?;
                self.replay(conn, id).await
            }
        }
    }

    /// Persist uncommitted events, snapshot and projections atomically
    ///
    /// # Errors
    ///
    /// - `EventVersionConflict` when another writer saved first
    /// - `Saver` / `Projector` when those steps fail
    /// - `Transaction` for store failures
    #[instrument(skip(self, conn, aggregate), fields(table = A::EVENT_TABLE, aggregate_id = %aggregate.id()))]
    pub async fn save(&self, conn: &mut SqliteConnection, aggregate: &mut A) -> LedgerResult<()> {
        let events = aggregate.uncommitted_events();
        if events.is_empty() {
            debug!("nothing to save");
            return Ok(());
        }

        let mut tx = conn
            .begin()
            .await
            .map_err(|e| LedgerError::transaction(format!("begin save to {}", A::EVENT_TABLE), e))?;

        self.store.append(&mut *tx, events).await?;

        if let Some(saver) = &self.saver {
            saver
                .save(&mut *tx, aggregate)
                .await
                .map_err(|e| LedgerError::saver(aggregate.id(), e))?;
        }

        for event in events {
            let event_type = event.payload.event_type();
            let Some(projectors) = self.projectors.get(&event_type) else {
                continue;
            };
            for projector in projectors {
                projector
                    .project(&mut *tx, aggregate, event)
                    .await
                    .map_err(|e| LedgerError::Projector {
                        aggregate_id: aggregate.id(),
                        event_type: event_type.to_string(),
                        source: Box::new(e),
                    })?;
                debug!(projector = projector.name(), %event_type, version = event.version, "projected");
            }
        }

        tx.commit()
            .await
            .map_err(|e| LedgerError::transaction(format!("commit save to {}", A::EVENT_TABLE), e))?;

        let saved = events.len();
        aggregate.clear_uncommitted_events();
        debug!(saved, version = aggregate.version(), "saved aggregate");
        Ok(())
    }

    async fn replay(&self, conn: &mut SqliteConnection, id: Uuid) -> LedgerResult<A> {
        let events = self.store.load(conn, id, 1).await?;
        if events.is_empty() {
            return Err(LedgerError::AggregateNotFound(id));
        }

        let mut aggregate = A::empty(id);
        for event in &events {
            aggregate.apply(event).map_err(|e| LedgerError::ApplyEvent {
                aggregate_id: id,
                event_type: event.payload.event_type().to_string(),
                version: event.version,
                source: Box::new(e),
            })?;
        }
        debug!(%id, replayed = events.len(), "replayed aggregate");
        Ok(aggregate)
    }
}
