// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Balance Bookkeeping
//!
//! `balance == available + pending` must hold after every fund movement,
//! and replaying the recorded events must land on the same numbers.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::fixtures::{fixed_timestamp, user_1};
use stock_ledger::{Aggregate, BalanceView, OrderType, Transaction};

// ============================================================================
// Strategies
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Movement {
    AvailableToPending,
    PendingToAvailable,
    CreditPending,
    DebitPending,
}

/// Money with two decimal places, up to 100 million
fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn movement() -> impl Strategy<Value = Movement> {
    prop_oneof![
        Just(Movement::AvailableToPending),
        Just(Movement::PendingToAvailable),
        Just(Movement::CreditPending),
        Just(Movement::DebitPending),
    ]
}

fn cash_type() -> impl Strategy<Value = OrderType> {
    prop_oneof![
        Just(OrderType::Deposit),
        Just(OrderType::Withdraw),
        Just(OrderType::Buy),
        Just(OrderType::Sell),
        Just(OrderType::Fee),
        Just(OrderType::Tax),
    ]
}

fn transaction(n: usize, order_type: OrderType, amount: Decimal) -> Transaction {
    let id = Uuid::from_u128(n as u128 + 1);
    let result = if order_type.is_outflow() {
        Transaction::debit(id, user_1(), None, order_type, amount, fixed_timestamp())
    } else {
        Transaction::credit(id, user_1(), None, order_type, amount, fixed_timestamp())
    };
    result.unwrap()
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: every single movement keeps the total split exactly
    #[test]
    fn prop_movements_preserve_split(
        initial in amount(),
        steps in prop::collection::vec((movement(), cash_type(), amount()), 1..40),
    ) {
        let mut view = BalanceView::open(user_1(), initial, fixed_timestamp()).unwrap();

        for (n, (movement, order_type, amount)) in steps.into_iter().enumerate() {
            let cash = transaction(n, order_type, amount);
            let before = view.balance;
            let moved = match movement {
                Movement::AvailableToPending => view.move_available_to_pending(&cash, fixed_timestamp()),
                Movement::PendingToAvailable => view.move_pending_to_available(&cash, fixed_timestamp()),
                Movement::CreditPending => view.credit_pending(&cash, fixed_timestamp()),
                Movement::DebitPending => view.debit_pending(&cash, fixed_timestamp()),
            };
            moved.unwrap();

            prop_assert_eq!(view.balance, view.available + view.pending);
            match movement {
                Movement::AvailableToPending | Movement::PendingToAvailable => {
                    prop_assert_eq!(view.balance, before, "bucket transfers keep the total");
                }
                Movement::CreditPending => {
                    prop_assert_eq!(view.balance, before + amount);
                }
                Movement::DebitPending => {
                    prop_assert_eq!(view.balance, before - amount);
                }
            }
        }
    }

    /// Property: posting settles fully and moves the total by the signed amount
    #[test]
    fn prop_post_settles_pending(
        initial in amount(),
        postings in prop::collection::vec((cash_type(), amount()), 1..30),
    ) {
        let mut view = BalanceView::open(user_1(), initial, fixed_timestamp()).unwrap();
        let mut expected = initial;

        for (n, (order_type, amount)) in postings.into_iter().enumerate() {
            let cash = transaction(n, order_type, amount);
            view.post(&cash, fixed_timestamp()).unwrap();
            expected += cash.amount();

            prop_assert_eq!(view.pending, Decimal::ZERO);
            prop_assert_eq!(view.available, view.balance);
            prop_assert_eq!(view.balance, expected);
        }
    }

    /// Property: replaying the recorded stream reproduces the live view
    #[test]
    fn prop_replay_matches_live(
        initial in amount(),
        postings in prop::collection::vec((cash_type(), amount()), 0..20),
    ) {
        let mut view = BalanceView::open(user_1(), initial, fixed_timestamp()).unwrap();
        for (n, (order_type, amount)) in postings.iter().copied().enumerate() {
            view.post(&transaction(n, order_type, amount), fixed_timestamp()).unwrap();
        }

        let replayed = BalanceView::from_events(user_1(), view.uncommitted_events()).unwrap();

        prop_assert_eq!(replayed.version(), view.version());
        prop_assert_eq!(replayed.version(), 1 + 2 * postings.len() as u64);
        prop_assert_eq!(replayed.balance, view.balance);
        prop_assert_eq!(replayed.available, view.available);
        prop_assert_eq!(replayed.pending, view.pending);
    }
}
