// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for ledger operations
//!
//! Every failure in the event store, the aggregate repository and the
//! posting protocol is reported as a [`LedgerError`]. Store failures carry
//! the statement context; repository step failures carry the aggregate id
//! and the event type that was being processed.

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur in ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No transition exists for the event from the current state
    #[error("no transition from state {from:?} on event {event_type} for aggregate {aggregate_id}")]
    NoTransition {
        aggregate_id: Uuid,
        from: String,
        event_type: String,
    },

    /// Event failed its own validation before being applied
    #[error("invalid event {event_type} for aggregate {aggregate_id}: {reason}")]
    InvalidEvent {
        aggregate_id: Uuid,
        event_type: String,
        reason: String,
    },

    /// Another writer already appended this version
    #[error("event version conflict for aggregate {aggregate_id} at version {version}")]
    EventVersionConflict { aggregate_id: Uuid, version: u64 },

    /// Aggregate has neither events nor a snapshot
    #[error("aggregate {0} not found")]
    AggregateNotFound(Uuid),

    /// Event type tag has no registered decoder
    #[error("event type {0:?} is not registered")]
    EventNotRegistered(String),

    /// Stored payload could not be decoded
    #[error("failed to decode {event_type} payload: {source}")]
    EventUnmarshal {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },

    /// Payload could not be encoded for storage
    #[error("failed to encode {event_type} payload: {source}")]
    EventMarshal {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },

    /// Underlying store failure inside a transactional region
    #[error("transaction error during {context}: {source}")]
    Transaction {
        context: String,
        #[source]
        source: sqlx::Error,
    },

    /// Snapshot loader failed
    #[error("failed to load snapshot of aggregate {aggregate_id}: {source}")]
    Loader {
        aggregate_id: Uuid,
        #[source]
        source: Box<LedgerError>,
    },

    /// Snapshot saver failed
    #[error("failed to save snapshot of aggregate {aggregate_id}: {source}")]
    Saver {
        aggregate_id: Uuid,
        #[source]
        source: Box<LedgerError>,
    },

    /// A projector registered for the event type failed
    #[error("projector for {event_type} failed on aggregate {aggregate_id}: {source}")]
    Projector {
        aggregate_id: Uuid,
        event_type: String,
        #[source]
        source: Box<LedgerError>,
    },

    /// Replaying a stored event failed
    #[error("failed to apply {event_type} version {version} to aggregate {aggregate_id}: {source}")]
    ApplyEvent {
        aggregate_id: Uuid,
        event_type: String,
        version: u64,
        #[source]
        source: Box<LedgerError>,
    },

    /// Unsigned value too large for an INTEGER column
    #[error("{column} value {value} exceeds the storable range")]
    ValueOutOfRange { column: &'static str, value: u64 },

    /// Snapshot column holds a value that cannot be decoded
    #[error("corrupt {column} column: {reason}")]
    SnapshotDecode { column: &'static str, reason: String },

    /// Order type tag is not one the ledger knows how to post
    #[error("unknown order type {0:?}")]
    UnknownOrderType(String),

    /// Order request with a price or quantity outside the accepted range
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    /// Request rejected before touching the store
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Projector rejected an event on purpose
    #[error("projection rejected: {0}")]
    ProjectionRejected(String),

    /// Operation exceeded its deadline and was rolled back
    #[error("operation {operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Schema migration failed
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

impl LedgerError {
    /// Wrap a store error with the statement it came from
    pub fn transaction(context: impl Into<String>, source: sqlx::Error) -> Self {
        LedgerError::Transaction {
            context: context.into(),
            source,
        }
    }

    /// Wrap a loader failure, letting not-found through untouched
    pub fn loader(aggregate_id: Uuid, err: LedgerError) -> Self {
        match err {
            LedgerError::AggregateNotFound(_) => err,
            other => LedgerError::Loader {
                aggregate_id,
                source: Box::new(other),
            },
        }
    }

    /// Wrap a saver failure
    pub fn saver(aggregate_id: Uuid, err: LedgerError) -> Self {
        LedgerError::Saver {
            aggregate_id,
            source: Box::new(err),
        }
    }

    /// True when the caller should reload and retry
    pub fn is_conflict(&self) -> bool {
        matches!(self, LedgerError::EventVersionConflict { .. })
    }

    /// Innermost error behind repository wrappers
    pub fn root_cause(&self) -> &LedgerError {
        match self {
            LedgerError::Loader { source, .. }
            | LedgerError::Saver { source, .. }
            | LedgerError::Projector { source, .. }
            | LedgerError::ApplyEvent { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
