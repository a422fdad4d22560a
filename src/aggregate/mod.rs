// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event-Sourced Aggregates
//!
//! An aggregate is a consistency boundary whose state only changes by
//! applying its own events. Commands on the concrete aggregates
//! ([`Order`], [`Transaction`], [`BalanceView`]) never assign fields
//! directly; they build a payload and call [`Aggregate::record`]:
//!
//! ```text
//! command ──▶ payload ──record──▶ transit_on_event ──▶ evolve ──▶ uncommitted events
//!                                      │
//!                                      └── error: aggregate unchanged
//! ```
//!
//! Replay from the event log goes through [`Aggregate::apply`], the same
//! validated path, so a stored stream that breaks the lifecycle is rejected
//! instead of producing a half-built aggregate.
//!
//! # Uncommitted Events
//!
//! Recorded events stay on the aggregate until the repository saves them.
//! A successful save clears the list; a failed save leaves it untouched so
//! the caller can inspect or discard the aggregate.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::LedgerResult;
use crate::events::Event;
use crate::state_machine::{transit_on_event, StateMachine};

pub mod balance_view;
pub mod order;
pub mod transaction;

pub use balance_view::BalanceView;
pub use order::Order;
pub use transaction::Transaction;

/// Identity, version and pending changes shared by every aggregate
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRoot<E> {
    id: Uuid,
    version: u64,
    changes: Vec<Event<E>>,
}

impl<E> AggregateRoot<E> {
    /// Root of an aggregate with no history
    pub fn new(id: Uuid) -> Self {
        Self::restored(id, 0)
    }

    /// Root of an aggregate rebuilt from a snapshot at `version`
    pub fn restored(id: Uuid, version: u64) -> Self {
        Self {
            id,
            version,
            changes: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Event-sourced aggregate
pub trait Aggregate: StateMachine + Send + Sync + Sized + 'static {
    /// Event log table of this aggregate type
    const EVENT_TABLE: &'static str;

    /// Aggregate with no history, in its initial state
    fn empty(id: Uuid) -> Self;

    fn root(&self) -> &AggregateRoot<Self::Event>;

    fn root_mut(&mut self) -> &mut AggregateRoot<Self::Event>;

    /// Fold a validated event into the fields, entering `next`
    fn evolve(&mut self, event: &Event<Self::Event>, next: Self::State);

    fn id(&self) -> Uuid {
        self.root().id
    }

    fn version(&self) -> u64 {
        self.root().version
    }

    /// Validate and fold one event
    ///
    /// # Errors
    ///
    /// Any error from [`transit_on_event`]; the aggregate is unchanged.
    fn apply(&mut self, event: &Event<Self::Event>) -> LedgerResult<()> {
        let next = transit_on_event(self, event)?;
        self.evolve(event, next);
        self.root_mut().version = event.version;
        Ok(())
    }

    /// Emit a new event at the next version and keep it as uncommitted
    fn record(
        &mut self,
        parent_id: Uuid,
        created_at: DateTime<Utc>,
        payload: impl Into<Self::Event>,
    ) -> LedgerResult<()> {
        let event = Event {
            aggregate_id: self.id(),
            parent_id,
            version: self.version() + 1,
            created_at,
            payload: payload.into(),
        };
        self.apply(&event)?;
        self.root_mut().changes.push(event);
        Ok(())
    }

    /// Events recorded since the last successful save
    fn uncommitted_events(&self) -> &[Event<Self::Event>] {
        &self.root().changes
    }

    fn clear_uncommitted_events(&mut self) {
        self.root_mut().changes.clear();
    }

    /// Rebuild an aggregate by replaying its stream
    fn from_events<'a, I>(id: Uuid, events: I) -> LedgerResult<Self>
    where
        I: IntoIterator<Item = &'a Event<Self::Event>>,
        Self::Event: 'a,
    {
        let mut aggregate = Self::empty(id);
        for event in events {
            aggregate.apply(event)?;
        }
        Ok(aggregate)
    }
}
