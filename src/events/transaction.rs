// Copyright (c) 2025 - Cowboy AI, Inc.
//! Transaction aggregate events

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EventPayload, EventType};
use crate::domain::OrderType;

pub const TRANSACTION_CREATED: EventType = EventType::new("transaction.created");
pub const TRANSACTION_COMPLETED: EventType = EventType::new("transaction.completed");
pub const TRANSACTION_FAILED: EventType = EventType::new("transaction.failed");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionCreated {
    pub user_id: Uuid,
    pub order_id: Option<Uuid>,
    pub order_type: OrderType,
    pub credit_amount: Decimal,
    pub debit_amount: Decimal,
}

impl EventPayload for TransactionCreated {
    fn validate(&self) -> Result<(), String> {
        if self.credit_amount < Decimal::ZERO || self.debit_amount < Decimal::ZERO {
            return Err(format!(
                "amounts must not be negative, got credit {} debit {}",
                self.credit_amount, self.debit_amount
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionCompleted {}

impl EventPayload for TransactionCompleted {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionFailed {
    #[serde(default)]
    pub reason: Option<String>,
}

impl EventPayload for TransactionFailed {}

crate::domain_events! {
    /// Events emitted by [`crate::aggregate::Transaction`]
    pub enum TransactionEvent {
        Created(TransactionCreated) => TRANSACTION_CREATED,
        Completed(TransactionCompleted) => TRANSACTION_COMPLETED,
        Failed(TransactionFailed) => TRANSACTION_FAILED,
    }
}
