// Copyright (c) 2025 - Cowboy AI, Inc.
//! Exchange fee, tax and profit-loss arithmetic
//!
//! Prices are quoted per share and quantities in lots, so every cash amount
//! is `price × quantity × LOT_SIZE`. Brokerage fee is charged on both legs
//! at the discounted fee rate; securities transaction tax is charged on the
//! selling leg only and is halved for a day trade.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Shares per lot
pub const LOT_SIZE: Decimal = dec!(1000);

/// Securities transaction tax rate on the selling leg
pub const TAX_RATE: Decimal = dec!(0.003);

/// Tax multiplier applied when both legs settle on the same day
pub const DAY_TRADE_TAX_RATE: Decimal = dec!(0.5);

/// Brokerage fee rate before discount
pub const FEE_RATE: Decimal = dec!(0.001425);

/// Broker discount applied to the fee rate
pub const BROKER_FEE_DISCOUNT: Decimal = dec!(0.25);

/// Legs in a full round trip, used to price the break-even fee
pub const ROUND_TRIP_LEGS: Decimal = dec!(2);

/// Decimal places kept on computed unit prices
pub const PRICE_SCALE: u32 = 4;

/// Highest accepted price per share
pub const MAX_PRICE: Decimal = dec!(10000000);

/// Largest accepted fill, in lots
pub const MAX_QUANTITY: u64 = 1_000_000_000;

/// Largest accepted single cash movement
pub const MAX_AMOUNT: Decimal = dec!(1000000000000000000);

/// Cash value of a trade
pub fn principal(price: Decimal, quantity: u64) -> Decimal {
    price * Decimal::from(quantity) * LOT_SIZE
}

/// Discounted brokerage fee for one leg
pub fn fee(principal: Decimal) -> Decimal {
    principal * FEE_RATE * BROKER_FEE_DISCOUNT
}

/// Transaction tax on a selling leg
pub fn tax(principal: Decimal, day_trade: bool) -> Decimal {
    let tax = principal * TAX_RATE;
    if day_trade {
        tax * DAY_TRADE_TAX_RATE
    } else {
        tax
    }
}

/// Round a unit price to [`PRICE_SCALE`] places
pub fn round_price(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Quantity-weighted average of an existing position and an added fill
pub fn weighted_average_price(
    price: Decimal,
    quantity: u64,
    added_price: Decimal,
    added_quantity: u64,
) -> Decimal {
    let total = quantity + added_quantity;
    if total == 0 {
        return Decimal::ZERO;
    }
    let value = price * Decimal::from(quantity) + added_price * Decimal::from(added_quantity);
    round_price(value / Decimal::from(total))
}

/// Realized or unrealized result of a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfitLoss {
    /// Net result in whole currency units
    pub amount: Decimal,
    /// Net result relative to money spent, in percent with two places
    pub percent: Decimal,
}

/// Running totals of money spent and received over the legs of a position
#[derive(Debug, Clone, Default)]
pub struct ProfitLossAccumulator {
    day_trade: bool,
    spent: Decimal,
    received: Decimal,
    fees: Decimal,
    taxes: Decimal,
}

impl ProfitLossAccumulator {
    pub fn new(day_trade: bool) -> Self {
        Self {
            day_trade,
            ..Self::default()
        }
    }

    /// Record a buying leg
    pub fn buy(&mut self, price: Decimal, quantity: u64) -> &mut Self {
        let cost = principal(price, quantity);
        let fee = fee(cost);
        self.fees += fee;
        self.spent += cost + fee;
        self
    }

    /// Record a selling leg
    pub fn sell(&mut self, price: Decimal, quantity: u64) -> &mut Self {
        let revenue = principal(price, quantity);
        let fee = fee(revenue);
        let tax = tax(revenue, self.day_trade);
        self.fees += fee;
        self.taxes += tax;
        self.received += revenue - fee - tax;
        self
    }

    pub fn spent(&self) -> Decimal {
        self.spent
    }

    pub fn received(&self) -> Decimal {
        self.received
    }

    pub fn fees(&self) -> Decimal {
        self.fees
    }

    pub fn taxes(&self) -> Decimal {
        self.taxes
    }

    /// Net result, whole units rounded half away from zero
    pub fn profit_loss(&self) -> ProfitLoss {
        let net = self.received - self.spent;
        let percent = if self.spent.is_zero() {
            Decimal::ZERO
        } else {
            (net / self.spent * dec!(100)).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        };
        ProfitLoss {
            amount: net.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
            percent,
        }
    }
}
