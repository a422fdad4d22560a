// Copyright (c) 2025 - Cowboy AI, Inc.
//! Ledger Domain Events
//!
//! Events are immutable facts about one aggregate instance. Each stored event
//! is an [`Event`] envelope (aggregate id, parent id, version, creation time)
//! around a typed payload enum generated by [`domain_events!`].
//!
//! # Event Sourcing Principles
//!
//! 1. **Events are immutable**: once appended they never change
//! 2. **Events are past tense**: `order.created`, not `create order`
//! 3. **Events are ordered**: `(aggregate_id, version)` is unique, versions start at 1
//! 4. **Events are tagged**: the type tag selects the payload decoder on replay
//!
//! # Wire Format
//!
//! The payload is stored as JSON text next to its tag:
//!
//! ```text
//! event_type = "balance.changed"
//! payload    = {"available_delta":"-100","pending_delta":"100", ...}
//! ```

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

pub mod balance;
pub mod order;
pub mod registry;
pub mod transaction;

pub use balance::{BalanceChanged, BalanceCreated, BalanceEvent};
pub use order::{OrderChanged, OrderClosed, OrderCreated, OrderEvent};
pub use registry::EventRegistry;
pub use transaction::{TransactionCompleted, TransactionCreated, TransactionEvent, TransactionFailed};

/// Event type tag, e.g. `order.created`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventType(&'static str);

impl EventType {
    pub const fn new(tag: &'static str) -> Self {
        Self(tag)
    }

    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Payload struct of a single event type
pub trait EventPayload: Serialize + DeserializeOwned {
    /// Reject payloads that can never be applied
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Closed set of payloads one aggregate type can emit
///
/// Implemented by [`domain_events!`]; the tag ↔ variant mapping is a static
/// match, so decoding needs no runtime type table.
pub trait DomainEvent: fmt::Debug + Clone + Send + Sync + Sized + 'static {
    /// Tag of this payload
    fn event_type(&self) -> EventType;

    /// Every tag this enum can decode
    fn event_types() -> &'static [EventType];

    /// Encode the payload without its tag
    fn to_payload(&self) -> serde_json::Result<serde_json::Value>;

    /// Decode a payload for `event_type`
    ///
    /// Returns `None` when the tag is not one of [`DomainEvent::event_types`].
    fn from_payload(
        event_type: &str,
        payload: serde_json::Value,
    ) -> Option<serde_json::Result<Self>>;

    /// Payload validation run before any state transition
    fn validate(&self) -> Result<(), String>;
}

/// Stored event envelope
#[derive(Debug, Clone, PartialEq)]
pub struct Event<E> {
    /// Aggregate this event belongs to
    pub aggregate_id: Uuid,
    /// Owning entity (the user for every ledger aggregate)
    pub parent_id: Uuid,
    /// Position in the aggregate's stream, starting at 1
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub payload: E,
}

impl<E: DomainEvent> Event<E> {
    pub fn event_type(&self) -> EventType {
        self.payload.event_type()
    }
}

/// Generate a payload enum implementing [`DomainEvent`]
///
/// ```rust,ignore
/// domain_events! {
///     pub enum OrderEvent {
///         Created(OrderCreated) => ORDER_CREATED,
///         Closed(OrderClosed) => ORDER_CLOSED,
///     }
/// }
/// ```
#[macro_export]
macro_rules! domain_events {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $variant:ident($payload:ty) => $tag:path ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis enum $name {
            $( $variant($payload), )+
        }

        impl $crate::events::DomainEvent for $name {
            fn event_type(&self) -> $crate::events::EventType {
                match self {
                    $( Self::$variant(_) => $tag, )+
                }
            }

            fn event_types() -> &'static [$crate::events::EventType] {
                &[ $( $tag, )+ ]
            }

            fn to_payload(&self) -> ::serde_json::Result<::serde_json::Value> {
                match self {
                    $( Self::$variant(payload) => ::serde_json::to_value(payload), )+
                }
            }

            fn from_payload(
                event_type: &str,
                payload: ::serde_json::Value,
            ) -> Option<::serde_json::Result<Self>> {
                $(
                    if event_type == $tag.as_str() {
                        return Some(::serde_json::from_value::<$payload>(payload).map(Self::$variant));
                    }
                )+
                None
            }

            fn validate(&self) -> Result<(), String> {
                match self {
                    $( Self::$variant(payload) => $crate::events::EventPayload::validate(payload), )+
                }
            }
        }

        $(
            impl From<$payload> for $name {
                fn from(payload: $payload) -> Self {
                    Self::$variant(payload)
                }
            }
        )+
    };
}
