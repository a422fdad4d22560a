// Copyright (c) 2025 - Cowboy AI, Inc.
//! Order side and ledger order-type vocabulary
//!
//! An [`OrderSide`] is the direction of a trade on an Order. An
//! [`OrderType`] tags a cash movement on a Transaction; every side maps to an
//! order type, plus the cash-only Fee, Tax, Deposit and Withdraw tags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::LedgerError;

/// Direction of a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    /// Buying shares, money leaves the account
    Buy,
    /// Selling shares, money enters the account
    Sell,
}

impl OrderSide {
    /// Canonical tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
        }
    }

    /// The side an open order must be on to absorb this one
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderSide {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match OrderType::from_str(s)? {
            OrderType::Buy => Ok(Self::Buy),
            OrderType::Sell => Ok(Self::Sell),
            other => Err(LedgerError::InvalidRequest(format!(
                "{other} is not a trade side"
            ))),
        }
    }
}

/// Cash-movement tag carried by every ledger transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Buy,
    Sell,
    Fee,
    Tax,
    Deposit,
    Withdraw,
}

impl OrderType {
    /// Canonical tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
            Self::Fee => "Fee",
            Self::Tax => "Tax",
            Self::Deposit => "Deposit",
            Self::Withdraw => "Withdraw",
        }
    }

    /// Money leaves the available bucket when this type is posted
    pub fn is_outflow(&self) -> bool {
        matches!(self, Self::Buy | Self::Fee | Self::Tax | Self::Withdraw)
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Buy" => Ok(Self::Buy),
            "Sell" => Ok(Self::Sell),
            "Fee" => Ok(Self::Fee),
            "Tax" => Ok(Self::Tax),
            "Deposit" => Ok(Self::Deposit),
            "Withdraw" => Ok(Self::Withdraw),
            other => Err(LedgerError::UnknownOrderType(other.to_string())),
        }
    }
}

impl From<OrderSide> for OrderType {
    fn from(side: OrderSide) -> Self {
        match side {
            OrderSide::Buy => Self::Buy,
            OrderSide::Sell => Self::Sell,
        }
    }
}
