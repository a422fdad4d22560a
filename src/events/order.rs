// Copyright (c) 2025 - Cowboy AI, Inc.
//! Order aggregate events

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EventPayload, EventType};
use crate::domain::OrderSide;

pub const ORDER_CREATED: EventType = EventType::new("order.created");
pub const ORDER_CHANGED: EventType = EventType::new("order.changed");
pub const ORDER_CLOSED: EventType = EventType::new("order.closed");

/// A new position was opened on one side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub user_id: Uuid,
    pub stock_id: String,
    pub side: OrderSide,
    pub price: Decimal,
    pub quantity: u64,
    pub trade_date: NaiveDate,
    /// Break-even unit price including round-trip fee and tax
    pub profitable_price: Decimal,
}

impl EventPayload for OrderCreated {
    fn validate(&self) -> Result<(), String> {
        if self.stock_id.is_empty() {
            return Err("stock id must not be empty".to_string());
        }
        if self.quantity == 0 {
            return Err("quantity must be positive".to_string());
        }
        if self.price <= Decimal::ZERO {
            return Err(format!("price must be positive, got {}", self.price));
        }
        Ok(())
    }
}

/// One side of the position now holds `quantity` lots at `price`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderChanged {
    pub side: OrderSide,
    pub price: Decimal,
    pub quantity: u64,
    pub trade_date: NaiveDate,
}

impl EventPayload for OrderChanged {
    fn validate(&self) -> Result<(), String> {
        if self.price < Decimal::ZERO {
            return Err(format!("price must not be negative, got {}", self.price));
        }
        Ok(())
    }
}

/// Buy and sell quantities matched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderClosed {}

impl EventPayload for OrderClosed {}

crate::domain_events! {
    /// Events emitted by [`crate::aggregate::Order`]
    pub enum OrderEvent {
        Created(OrderCreated) => ORDER_CREATED,
        Changed(OrderChanged) => ORDER_CHANGED,
        Closed(OrderClosed) => ORDER_CLOSED,
    }
}
