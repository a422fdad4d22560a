// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Trade Arithmetic
//!
//! Fee, tax and average-price helpers feed every posting chain, so their
//! bounds are checked over a wide range of prices and lot counts.

use proptest::prelude::*;
use rust_decimal::Decimal;

use stock_ledger::aggregate::order::profitable_price;
use stock_ledger::domain::fees::{fee, principal, round_price, tax, weighted_average_price};
use stock_ledger::domain::ProfitLossAccumulator;
use stock_ledger::OrderSide;

// ============================================================================
// Strategies
// ============================================================================

/// Quoted price with two decimal places, 0.01 to 10000.00
fn price() -> impl Strategy<Value = Decimal> {
    (1i64..=1_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn lots() -> impl Strategy<Value = u64> {
    1u64..1_000
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: the merged price lies between the two inputs
    #[test]
    fn prop_weighted_average_is_bounded(
        held_price in price(),
        held in lots(),
        added_price in price(),
        added in lots(),
    ) {
        let average = weighted_average_price(held_price, held, added_price, added);
        prop_assert!(average >= held_price.min(added_price));
        prop_assert!(average <= held_price.max(added_price));
    }

    /// Property: merging equal prices leaves the price unchanged
    #[test]
    fn prop_weighted_average_of_equal_prices(p in price(), held in 0u64..1_000, added in lots()) {
        prop_assert_eq!(weighted_average_price(p, held, p, added), p);
    }

    /// Property: breaking even costs more than the buy and yields less than the sell
    #[test]
    fn prop_profitable_price_covers_costs(p in price(), quantity in lots()) {
        let buy = profitable_price(OrderSide::Buy, p, quantity);
        let sell = profitable_price(OrderSide::Sell, p, quantity);

        prop_assert!(buy >= p);
        prop_assert!(sell <= p);
        prop_assert_eq!(buy, round_price(buy));
        prop_assert_eq!(sell, round_price(sell));
    }

    /// Property: costs are non-negative and scale with the principal
    #[test]
    fn prop_costs_scale_with_principal(p in price(), quantity in lots()) {
        let single = principal(p, 1);
        let whole = principal(p, quantity);
        let n = Decimal::from(quantity);

        prop_assert_eq!(whole, single * n);
        prop_assert!(fee(whole) >= Decimal::ZERO);
        prop_assert!(tax(whole, false) >= Decimal::ZERO);
        prop_assert_eq!(fee(whole), fee(single) * n);
        prop_assert_eq!(tax(whole, false), tax(single, false) * n);
        prop_assert_eq!(tax(whole, true) * Decimal::TWO, tax(whole, false));
    }

    /// Property: a flat round trip always loses exactly its costs
    #[test]
    fn prop_flat_round_trip_loses_costs(p in price(), quantity in lots(), day_trade in any::<bool>()) {
        let mut acc = ProfitLossAccumulator::new(day_trade);
        acc.buy(p, quantity).sell(p, quantity);

        prop_assert_eq!(acc.received() - acc.spent(), -(acc.fees() + acc.taxes()));
        prop_assert!(acc.profit_loss().amount <= Decimal::ZERO);
    }
}
