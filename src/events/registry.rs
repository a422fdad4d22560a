// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event Registry
//!
//! Maps a stored event-type tag to the payload decoder of one aggregate
//! type. A registry is normally derived from the aggregate's transition
//! table, so every event that can legally be applied can also be decoded.
//! Tags handled through `skip_transition` have no table row and are added
//! with [`EventRegistry::register`].

use std::collections::BTreeMap;
use std::marker::PhantomData;

use super::{DomainEvent, EventType};
use crate::errors::{LedgerError, LedgerResult};
use crate::state_machine::StateMachine;

/// Tag → decoder table for the payload enum `E`
#[derive(Debug, Clone)]
pub struct EventRegistry<E> {
    types: BTreeMap<&'static str, EventType>,
    _events: PhantomData<fn() -> E>,
}

impl<E: DomainEvent> Default for EventRegistry<E> {
    fn default() -> Self {
        Self {
            types: BTreeMap::new(),
            _events: PhantomData,
        }
    }
}

impl<E: DomainEvent> EventRegistry<E> {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every event type named in `M`'s transition table
    pub fn from_state_machine<M>() -> Self
    where
        M: StateMachine<Event = E>,
    {
        let mut registry = Self::new();
        for transition in M::transitions() {
            registry.register(transition.event_type);
        }
        registry
    }

    /// Add an event type
    pub fn register(&mut self, event_type: EventType) -> &mut Self {
        self.types.insert(event_type.as_str(), event_type);
        self
    }

    /// Look up a tag
    ///
    /// # Errors
    ///
    /// `EventNotRegistered` if the tag was never registered
    pub fn get(&self, tag: &str) -> LedgerResult<EventType> {
        self.types
            .get(tag)
            .copied()
            .ok_or_else(|| LedgerError::EventNotRegistered(tag.to_string()))
    }

    /// Registered tags in lexical order
    pub fn event_types(&self) -> impl Iterator<Item = EventType> + '_ {
        self.types.values().copied()
    }

    /// Decode a stored payload
    ///
    /// # Errors
    ///
    /// - `EventNotRegistered` for an unknown tag
    /// - `EventUnmarshal` when the payload does not match the tag's shape
    pub fn decode(&self, tag: &str, payload: serde_json::Value) -> LedgerResult<E> {
        let event_type = self.get(tag)?;
        match E::from_payload(event_type.as_str(), payload) {
            Some(Ok(event)) => Ok(event),
            Some(Err(source)) => Err(LedgerError::EventUnmarshal {
                event_type: tag.to_string(),
                source,
            }),
            None => Err(LedgerError::EventNotRegistered(tag.to_string())),
        }
    }

    /// Encode a payload for storage
    ///
    /// # Errors
    ///
    /// `EventMarshal` when serialization fails
    pub fn encode(&self, event: &E) -> LedgerResult<serde_json::Value> {
        event.to_payload().map_err(|source| LedgerError::EventMarshal {
            event_type: event.event_type().to_string(),
            source,
        })
    }
}
