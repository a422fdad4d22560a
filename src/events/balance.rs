// Copyright (c) 2025 - Cowboy AI, Inc.
//! BalanceView aggregate events

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EventPayload, EventType};
use crate::domain::OrderType;

pub const BALANCE_CREATED: EventType = EventType::new("balance.created");
pub const BALANCE_CHANGED: EventType = EventType::new("balance.changed");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceCreated {
    pub initial_balance: Decimal,
    pub currency: String,
}

impl EventPayload for BalanceCreated {
    fn validate(&self) -> Result<(), String> {
        if self.currency.is_empty() {
            return Err("currency must not be empty".to_string());
        }
        Ok(())
    }
}

/// Money moved between buckets or in or out of the account
///
/// `available_delta + pending_delta` is the change of the total balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceChanged {
    pub available_delta: Decimal,
    pub pending_delta: Decimal,
    /// Signed amount of the transaction, credit minus debit
    pub amount: Decimal,
    pub currency: String,
    pub transaction_id: Uuid,
    pub order_type: OrderType,
}

impl EventPayload for BalanceChanged {
    fn validate(&self) -> Result<(), String> {
        if self.currency.is_empty() {
            return Err("currency must not be empty".to_string());
        }
        Ok(())
    }
}

crate::domain_events! {
    /// Events emitted by [`crate::aggregate::BalanceView`]
    pub enum BalanceEvent {
        Created(BalanceCreated) => BALANCE_CREATED,
        Changed(BalanceChanged) => BALANCE_CHANGED,
    }
}
