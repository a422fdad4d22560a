// Copyright (c) 2025 - Cowboy AI, Inc.
//! Ledger domain vocabulary
//!
//! Value types shared by the aggregates and the posting protocol:
//!
//! - [`OrderSide`] - direction of a trade
//! - [`OrderType`] - tag on every cash movement
//! - [`fees`] - exchange fee, tax and profit-loss arithmetic

pub mod fees;
pub mod order_type;

pub use fees::{ProfitLoss, ProfitLossAccumulator};
pub use order_type::{OrderSide, OrderType};

/// Ledger currency code
pub const CURRENCY: &str = "TWD";
