// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Event Encoding
//!
//! Every registered event type must decode back to an equal value from
//! the payload the registry encodes for storage.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use stock_ledger::events::{
    BalanceChanged, BalanceCreated, BalanceEvent, OrderChanged, OrderClosed, OrderCreated, OrderEvent,
    TransactionCompleted, TransactionCreated, TransactionEvent, TransactionFailed,
};
use stock_ledger::{BalanceView, DomainEvent, EventRegistry, Order, OrderSide, OrderType, Transaction};

// ============================================================================
// Strategies
// ============================================================================

fn decimal() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000_000_000, 0u32..8).prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale))
}

fn uuid() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

fn date() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn side() -> impl Strategy<Value = OrderSide> {
    prop_oneof![Just(OrderSide::Buy), Just(OrderSide::Sell)]
}

fn order_type() -> impl Strategy<Value = OrderType> {
    prop_oneof![
        Just(OrderType::Buy),
        Just(OrderType::Sell),
        Just(OrderType::Fee),
        Just(OrderType::Tax),
        Just(OrderType::Deposit),
        Just(OrderType::Withdraw),
    ]
}

fn order_event() -> impl Strategy<Value = OrderEvent> {
    prop_oneof![
        (uuid(), "[0-9]{4,6}", side(), decimal(), 1u64..10_000, date(), decimal()).prop_map(
            |(user_id, stock_id, side, price, quantity, trade_date, profitable_price)| -> OrderEvent {
                OrderCreated {
                    user_id,
                    stock_id,
                    side,
                    price,
                    quantity,
                    trade_date,
                    profitable_price,
                }
                .into()
            }
        ),
        (side(), decimal(), 0u64..10_000, date()).prop_map(|(side, price, quantity, trade_date)| -> OrderEvent {
            OrderChanged {
                side,
                price,
                quantity,
                trade_date,
            }
            .into()
        }),
        Just(OrderEvent::from(OrderClosed {})),
    ]
}

fn transaction_event() -> impl Strategy<Value = TransactionEvent> {
    prop_oneof![
        (uuid(), proptest::option::of(uuid()), order_type(), decimal(), decimal()).prop_map(
            |(user_id, order_id, order_type, credit_amount, debit_amount)| -> TransactionEvent {
                TransactionCreated {
                    user_id,
                    order_id,
                    order_type,
                    credit_amount,
                    debit_amount,
                }
                .into()
            }
        ),
        Just(TransactionEvent::from(TransactionCompleted {})),
        proptest::option::of("[a-z ]{0,24}").prop_map(|reason| TransactionEvent::from(TransactionFailed { reason })),
    ]
}

fn balance_event() -> impl Strategy<Value = BalanceEvent> {
    prop_oneof![
        decimal().prop_map(|initial_balance| -> BalanceEvent {
            BalanceCreated {
                initial_balance,
                currency: "TWD".to_string(),
            }
            .into()
        }),
        (decimal(), decimal(), decimal(), uuid(), order_type()).prop_map(
            |(available, pending, amount, transaction_id, order_type)| -> BalanceEvent {
                BalanceChanged {
                    available_delta: -available,
                    pending_delta: pending,
                    amount,
                    currency: "TWD".to_string(),
                    transaction_id,
                    order_type,
                }
                .into()
            }
        ),
    ]
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_order_events_roundtrip(event in order_event()) {
        let registry = EventRegistry::<OrderEvent>::from_state_machine::<Order>();
        let payload = registry.encode(&event).unwrap();
        let decoded = registry.decode(event.event_type().as_str(), payload).unwrap();
        prop_assert_eq!(decoded, event);
    }

    #[test]
    fn prop_transaction_events_roundtrip(event in transaction_event()) {
        let registry = EventRegistry::<TransactionEvent>::from_state_machine::<Transaction>();
        let payload = registry.encode(&event).unwrap();
        let decoded = registry.decode(event.event_type().as_str(), payload).unwrap();
        prop_assert_eq!(decoded, event);
    }

    #[test]
    fn prop_balance_events_roundtrip(event in balance_event()) {
        let registry = EventRegistry::<BalanceEvent>::from_state_machine::<BalanceView>();
        let payload = registry.encode(&event).unwrap();
        let decoded = registry.decode(event.event_type().as_str(), payload).unwrap();
        prop_assert_eq!(decoded, event);
    }

    /// Property: one aggregate's registry never decodes another's events
    #[test]
    fn prop_foreign_tags_are_unregistered(event in balance_event()) {
        let registry = EventRegistry::<OrderEvent>::from_state_machine::<Order>();
        let payload = event.to_payload().unwrap();
        prop_assert!(registry.decode(event.event_type().as_str(), payload).is_err());
    }
}
