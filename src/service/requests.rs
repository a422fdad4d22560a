// Copyright (c) 2025 - Cowboy AI, Inc.
//! Requests accepted by the ledger service

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::fees::{MAX_PRICE, MAX_QUANTITY};
use crate::domain::OrderSide;
use crate::errors::{LedgerError, LedgerResult};

/// A fill to book against a user's positions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: Uuid,
    pub stock_id: String,
    pub side: OrderSide,
    /// Price per share
    pub price: Decimal,
    /// Lots of 1000 shares
    pub quantity: u64,
    /// Exchange date of the fill
    pub trade_date: NaiveDate,
}

impl CreateOrderRequest {
    pub fn buy(
        user_id: Uuid,
        stock_id: impl Into<String>,
        price: Decimal,
        quantity: u64,
        trade_date: NaiveDate,
    ) -> Self {
        Self {
            user_id,
            stock_id: stock_id.into(),
            side: OrderSide::Buy,
            price,
            quantity,
            trade_date,
        }
    }

    pub fn sell(
        user_id: Uuid,
        stock_id: impl Into<String>,
        price: Decimal,
        quantity: u64,
        trade_date: NaiveDate,
    ) -> Self {
        Self {
            side: OrderSide::Sell,
            ..Self::buy(user_id, stock_id, price, quantity, trade_date)
        }
    }

    /// # Errors
    ///
    /// `InvalidOrder` for an empty symbol, or a price or quantity that is
    /// not positive or exceeds [`MAX_PRICE`] / [`MAX_QUANTITY`].
    pub fn validate(&self) -> LedgerResult<()> {
        if self.stock_id.trim().is_empty() {
            return Err(LedgerError::InvalidOrder("stock id is empty".to_string()));
        }
        if self.quantity == 0 {
            return Err(LedgerError::InvalidOrder("quantity must be positive".to_string()));
        }
        if self.quantity > MAX_QUANTITY {
            return Err(LedgerError::InvalidOrder(format!(
                "quantity {} exceeds {MAX_QUANTITY} lots",
                self.quantity
            )));
        }
        if self.price <= Decimal::ZERO {
            return Err(LedgerError::InvalidOrder(format!(
                "price must be positive, got {}",
                self.price
            )));
        }
        if self.price > MAX_PRICE {
            return Err(LedgerError::InvalidOrder(format!(
                "price {} exceeds {MAX_PRICE}",
                self.price
            )));
        }
        Ok(())
    }
}
