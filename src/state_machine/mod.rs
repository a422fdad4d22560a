// Copyright (c) 2025 - Cowboy AI, Inc.
//! Finite State Machine Abstractions
//!
//! Every aggregate declares its current state and a static transition table
//! of `(from, event_type) → to` rows. [`transit_on_event`] is the single
//! gate events pass through before they touch aggregate fields:
//!
//! ```text
//! Event ──validate──▶ skip_transition? ──yes──▶ current state
//!                          │ no
//!                          ▼
//!              table[(current, event_type)] ──▶ next state
//!                          │ missing
//!                          ▼
//!                   NoTransition error
//! ```
//!
//! # Design Principles
//!
//! 1. **Type Safety**: states are enums, tags are [`EventType`] constants
//! 2. **Pure Functions**: the lookup has no side effects
//! 3. **Explicit**: every legal transition is a table row
//!
//! # Example
//!
//! ```rust,ignore
//! const TRANSITIONS: &[Transition<OrderState>] = &[
//!     Transition::new(OrderState::Init, ORDER_CREATED, OrderState::Created),
//!     Transition::new(OrderState::Created, ORDER_CHANGED, OrderState::Changed),
//! ];
//! ```

use std::fmt;

use crate::errors::{LedgerError, LedgerResult};
use crate::events::{DomainEvent, Event, EventType};

pub mod ledger_lifecycle;

pub use ledger_lifecycle::{BalanceState, OrderState, TransactionState};

/// One row of a transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<S> {
    pub from: S,
    pub event_type: EventType,
    pub to: S,
}

impl<S> Transition<S> {
    pub const fn new(from: S, event_type: EventType, to: S) -> Self {
        Self {
            from,
            event_type,
            to,
        }
    }
}

/// Aggregate lifecycle contract
pub trait StateMachine {
    /// Lifecycle state
    type State: Copy + Eq + fmt::Debug + fmt::Display + 'static;

    /// Payload enum the machine reacts to
    type Event: DomainEvent;

    fn current_state(&self) -> Self::State;

    /// Static transition table
    fn transitions() -> &'static [Transition<Self::State>];

    /// Events that keep the current state without a table row
    fn skip_transition(&self, _event: &Self::Event) -> bool {
        false
    }
}

/// Resolve the state an event leads to
///
/// # Errors
///
/// - `InvalidEvent` when the payload fails validation
/// - `NoTransition` when the table has no row for the current state and tag
pub fn transit_on_event<M: StateMachine>(
    machine: &M,
    event: &Event<M::Event>,
) -> LedgerResult<M::State> {
    let event_type = event.payload.event_type();

    event
        .payload
        .validate()
        .map_err(|reason| LedgerError::InvalidEvent {
            aggregate_id: event.aggregate_id,
            event_type: event_type.to_string(),
            reason,
        })?;

    let current = machine.current_state();
    if machine.skip_transition(&event.payload) {
        return Ok(current);
    }

    M::transitions()
        .iter()
        .find(|t| t.from == current && t.event_type == event_type)
        .map(|t| t.to)
        .ok_or_else(|| LedgerError::NoTransition {
            aggregate_id: event.aggregate_id,
            from: current.to_string(),
            event_type: event_type.to_string(),
        })
}

/// Whether the table allows `event_type` from `state`
pub fn can_transit<M: StateMachine>(state: M::State, event_type: EventType) -> bool {
    M::transitions()
        .iter()
        .any(|t| t.from == state && t.event_type == event_type)
}
