// Copyright (c) 2025 - Cowboy AI, Inc.
//! Integration tests for the ledger service
//!
//! Every test runs against a fresh in-memory database and covers one use
//! case end to end: the orders touched, the transaction chain posted, and
//! the resulting balance and balance history.

mod fixtures;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sqlx::SqliteConnection;

use fixtures::*;
use stock_ledger::domain::fees::{MAX_AMOUNT, MAX_QUANTITY};
use stock_ledger::events::balance::BALANCE_CREATED;
use stock_ledger::events::transaction::TRANSACTION_COMPLETED;
use stock_ledger::events::{BalanceEvent, Event, TransactionEvent};
use stock_ledger::prices::StaticPriceSource;
use stock_ledger::projection::Projector;
use stock_ledger::state_machine::{OrderState, TransactionState};
use stock_ledger::{
    Aggregate, BalanceView, CreateOrderRequest, LedgerError, LedgerResult, OrderFilter, OrderSide,
    OrderType, Transaction,
};

// ============================================================================
// Test Projectors
// ============================================================================

/// Rejects every completed fee transaction
struct FeeLedgerOffline;

#[async_trait]
impl Projector<Transaction> for FeeLedgerOffline {
    async fn project(
        &self,
        _conn: &mut SqliteConnection,
        transaction: &Transaction,
        _event: &Event<TransactionEvent>,
    ) -> LedgerResult<()> {
        if transaction.order_type == OrderType::Fee {
            return Err(LedgerError::ProjectionRejected("fee ledger offline".to_string()));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "fee-ledger"
    }
}

/// Stalls far beyond any test deadline
struct Stall;

#[async_trait]
impl Projector<BalanceView> for Stall {
    async fn project(
        &self,
        _conn: &mut SqliteConnection,
        _view: &BalanceView,
        _event: &Event<BalanceEvent>,
    ) -> LedgerResult<()> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }

    fn name(&self) -> &str {
        "stall"
    }
}

async fn count(service: &stock_ledger::LedgerService, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(service.pool())
        .await
        .unwrap()
}

fn buy(quantity: u64, price: rust_decimal::Decimal, day: u32) -> CreateOrderRequest {
    CreateOrderRequest::buy(user_1(), STOCK_ID, price, quantity, trade_date(day))
}

fn sell(quantity: u64, price: rust_decimal::Decimal, day: u32) -> CreateOrderRequest {
    CreateOrderRequest::sell(user_1(), STOCK_ID, price, quantity, trade_date(day))
}

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
async fn test_open_account() {
    let service = funded_service().await;

    let view = service.get_balance_view(user_1()).await.unwrap();
    assert_eq!(view.balance, INITIAL_BALANCE);
    assert_eq!(view.available, INITIAL_BALANCE);
    assert_eq!(view.pending, dec!(0));
    assert_eq!(view.currency, "TWD");
    assert_eq!(view.version(), 1);
}

#[tokio::test]
async fn test_open_account_twice_conflicts() {
    let service = funded_service().await;

    let err = service.open_account(user_1(), dec!(5)).await.unwrap_err();

    assert!(err.is_conflict(), "unexpected error: {err}");
    let view = service.get_balance_view(user_1()).await.unwrap();
    assert_eq!(view.balance, INITIAL_BALANCE);
}

#[tokio::test]
async fn test_missing_account() {
    let service = service().await;

    let err = service.get_balance_view(user_2()).await.unwrap_err();
    assert!(matches!(err, LedgerError::AggregateNotFound(id) if id == user_2()));

    let err = service.create_order(buy(1, dec!(50), 11)).await.unwrap_err();
    assert!(matches!(err, LedgerError::AggregateNotFound(_)));
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn test_buy_opens_order_and_posts_principal_and_fee() {
    let service = funded_service().await;

    let orders = service.create_order(buy(2, dec!(84.90), 11)).await.unwrap();

    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.status, OrderState::Created);
    assert_eq!(order.buy_quantity, 2);
    assert_eq!(order.buy_price, dec!(84.90));
    assert_eq!(order.sell_quantity, 0);
    assert_eq!(order.profitable_price, dec!(85.2152));

    let chain = service.list_order_transactions(order.id()).await.unwrap();
    let postings: Vec<_> = chain
        .iter()
        .map(|t| (t.order_type, t.debit_amount, t.status))
        .collect();
    assert_eq!(
        postings,
        vec![
            (OrderType::Buy, dec!(169800), TransactionState::Completed),
            (OrderType::Fee, dec!(60.49125), TransactionState::Completed),
        ]
    );

    let view = service.get_balance_view(user_1()).await.unwrap();
    assert_eq!(view.balance, dec!(830139.50875));
    assert_eq!(view.available, dec!(830139.50875));
    assert_eq!(view.pending, dec!(0));
    assert_eq!(view.version(), 5);
}

#[tokio::test]
async fn test_matching_sell_closes_order() {
    let service = funded_service().await;
    let opened = service.create_order(buy(2, dec!(84.90), 11)).await.unwrap();

    let closed = service.create_order(sell(2, dec!(88.60), 12)).await.unwrap();

    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].id(), opened[0].id());
    assert_eq!(closed[0].status, OrderState::Closed);
    assert_eq!(closed[0].sell_price, dec!(88.60));

    let chain = service.list_order_transactions(closed[0].id()).await.unwrap();
    let types: Vec<_> = chain.iter().map(|t| (t.order_type, t.amount())).collect();
    assert_eq!(
        types,
        vec![
            (OrderType::Buy, dec!(-169800)),
            (OrderType::Fee, dec!(-60.49125)),
            (OrderType::Sell, dec!(177200)),
            (OrderType::Tax, dec!(-531.6)),
            (OrderType::Fee, dec!(-63.1275)),
        ]
    );

    // Cash moved by exactly the unrounded round-trip result
    let view = service.get_balance_view(user_1()).await.unwrap();
    assert_eq!(view.balance, dec!(1006744.78125));

    let listed = service.list_orders(OrderFilter::for_user(user_1())).await.unwrap();
    let pl = listed[0].profit_loss.unwrap();
    assert_eq!(pl.amount, dec!(6745));
    assert_eq!(pl.percent, dec!(3.97));
}

#[tokio::test]
async fn test_day_trade_halves_tax() {
    let service = funded_service().await;
    service.create_order(buy(2, dec!(84.90), 11)).await.unwrap();
    let closed = service.create_order(sell(2, dec!(88.60), 11)).await.unwrap();

    let chain = service.list_order_transactions(closed[0].id()).await.unwrap();
    let tax = chain.iter().find(|t| t.order_type == OrderType::Tax).unwrap();
    assert_eq!(tax.debit_amount, dec!(265.8));

    let order = service.get_order(closed[0].id()).await.unwrap();
    let pl = order.profit_loss.unwrap();
    assert_eq!(pl.amount, dec!(7011));
    assert_eq!(pl.percent, dec!(4.13));
}

#[tokio::test]
async fn test_partial_sells_average_the_sell_price() {
    let service = funded_service().await;
    service.create_order(buy(3, dec!(84.9), 11)).await.unwrap();
    service.create_order(sell(1, dec!(88), 12)).await.unwrap();

    let orders = service.create_order(sell(1, dec!(90), 13)).await.unwrap();

    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.status, OrderState::Changed);
    assert_eq!(order.sell_quantity, 2);
    assert_eq!(order.sell_price, dec!(89));
    assert_eq!(order.sell_date, Some(trade_date(13)));
    assert_eq!(order.unmatched_quantity(), 1);
}

#[tokio::test]
async fn test_oversell_closes_and_opens_short() {
    let service = funded_service().await;
    service.create_order(buy(2, dec!(84.9), 11)).await.unwrap();

    let orders = service.create_order(sell(3, dec!(88), 12)).await.unwrap();

    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].status, OrderState::Closed);
    assert_eq!(orders[0].sell_quantity, 2);

    let short = &orders[1];
    assert_eq!(short.status, OrderState::Created);
    assert_eq!(short.sell_quantity, 1);
    assert_eq!(short.buy_quantity, 0);
    assert_eq!(short.sell_price, dec!(88));

    // Only the order holding both sides pays tax
    let closed_chain = service.list_order_transactions(orders[0].id()).await.unwrap();
    let short_chain = service.list_order_transactions(short.id()).await.unwrap();
    assert!(closed_chain.iter().any(|t| t.order_type == OrderType::Tax));
    assert!(!short_chain.iter().any(|t| t.order_type == OrderType::Tax));
    assert_eq!(
        short_chain.iter().map(|t| t.amount()).collect::<Vec<_>>(),
        vec![dec!(88000), dec!(-31.35)]
    );

    let open = service
        .list_open_orders(user_1(), STOCK_ID, OrderSide::Buy)
        .await
        .unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id(), short.id());
    assert!(service
        .list_open_orders(user_1(), STOCK_ID, OrderSide::Sell)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_invalid_orders_are_rejected() {
    let service = funded_service().await;

    for request in [buy(0, dec!(84.9), 11), buy(1, dec!(0), 11), buy(1, dec!(-3), 11)] {
        let err = service.create_order(request).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidOrder(_)), "unexpected error: {err}");
    }
    assert_eq!(count(&service, "orders").await, 0);
}

/// Test: fills too large to price or store are refused before any write
#[tokio::test]
async fn test_oversized_orders_are_rejected() {
    let service = funded_service().await;

    let oversized = [
        buy(2, Decimal::MAX / dec!(10), 11),
        buy(MAX_QUANTITY + 1, dec!(84.9), 11),
        buy(i64::MAX as u64 + 1, dec!(0.0000000001), 11),
    ];
    for request in oversized {
        let err = service.create_order(request).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidOrder(_)), "unexpected error: {err}");
    }

    assert_eq!(count(&service, "orders").await, 0);
    assert_eq!(count(&service, "transactions").await, 0);
    let orders = service.list_orders(OrderFilter::for_user(user_1())).await.unwrap();
    assert!(orders.is_empty());
    let view = service.get_balance_view(user_1()).await.unwrap();
    assert_eq!(view.balance, INITIAL_BALANCE);
    assert_eq!(view.version(), 1);
}

#[tokio::test]
async fn test_list_orders_values_open_orders_at_market() {
    let clock = fixed_clock();
    let prices = StaticPriceSource::new().with_price(STOCK_ID, dec!(86.6));
    let service = service_with(memory_pool().await, clock, prices);
    service.open_account(user_1(), INITIAL_BALANCE).await.unwrap();
    service.create_order(buy(2, dec!(84.9), 11)).await.unwrap();
    service.create_order(sell(1, dec!(88.7), 12)).await.unwrap();

    let orders = service.list_orders(OrderFilter::for_user(user_1())).await.unwrap();

    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].current_price, Some(dec!(86.6)));
    let pl = orders[0].profit_loss.unwrap();
    assert_eq!(pl.amount, dec!(4851));
    assert_eq!(pl.percent, dec!(2.86));
}

#[tokio::test]
async fn test_list_orders_without_price_has_no_result() {
    let service = funded_service().await;
    service.create_order(buy(2, dec!(84.9), 11)).await.unwrap();

    let orders = service.list_orders(OrderFilter::for_user(user_1())).await.unwrap();

    assert_eq!(orders[0].profit_loss, None);
    assert_eq!(orders[0].current_price, None);
}

#[tokio::test]
async fn test_list_orders_filters() {
    let service = funded_service().await;
    service.create_order(buy(2, dec!(84.9), 11)).await.unwrap();
    service.create_order(sell(2, dec!(88.6), 12)).await.unwrap();
    service
        .create_order(CreateOrderRequest::buy(user_1(), "2317", dec!(104), 1, trade_date(13)))
        .await
        .unwrap();

    let all = service.list_orders(OrderFilter::for_user(user_1())).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].stock_id, "2317", "newest first");

    let closed = service
        .list_orders(OrderFilter::for_user(user_1()).with_status(OrderState::Closed))
        .await
        .unwrap();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].stock_id, STOCK_ID);

    let by_stock = service
        .list_orders(OrderFilter::for_user(user_1()).with_stock_ids(["2317"]))
        .await
        .unwrap();
    assert_eq!(by_stock.len(), 1);

    let october = service
        .list_orders(OrderFilter::for_user(user_1()).with_exchange_month("202310"))
        .await
        .unwrap();
    assert_eq!(october.len(), 2);

    let november = service
        .list_orders(OrderFilter::for_user(user_1()).with_exchange_month("202311"))
        .await
        .unwrap();
    assert!(november.is_empty());

    let paged = service
        .list_orders(OrderFilter::for_user(user_1()).with_page(1, 1))
        .await
        .unwrap();
    assert_eq!(paged.len(), 1);
    assert_eq!(paged[0].stock_id, STOCK_ID);

    let err = service
        .list_orders(OrderFilter::for_user(user_1()).with_exchange_month("2023"))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidRequest(_)));

    let other_user = service.list_orders(OrderFilter::for_user(user_2())).await.unwrap();
    assert!(other_user.is_empty());
}

// ============================================================================
// Chained Posting
// ============================================================================

#[tokio::test]
async fn test_failed_fee_rolls_back_whole_chain() {
    let mut service = funded_service().await;
    service.add_transaction_projector(TRANSACTION_COMPLETED, Arc::new(FeeLedgerOffline));

    let err = service.create_order(buy(2, dec!(84.9), 11)).await.unwrap_err();

    assert!(
        matches!(err.root_cause(), LedgerError::ProjectionRejected(_)),
        "unexpected error: {err}"
    );
    assert_eq!(count(&service, "orders").await, 0);
    assert_eq!(count(&service, "order_events").await, 0);
    assert_eq!(count(&service, "transactions").await, 0);
    assert_eq!(count(&service, "transaction_events").await, 0);
    assert_eq!(count(&service, "balance_history").await, 0);

    let view = service.get_balance_view(user_1()).await.unwrap();
    assert_eq!(view.balance, INITIAL_BALANCE);
    assert_eq!(view.version(), 1);
}

#[tokio::test]
async fn test_deposit_and_withdraw() {
    let service = funded_service().await;

    let deposit = service
        .create_transaction(user_1(), OrderType::Deposit, dec!(5000))
        .await
        .unwrap();
    assert_eq!(deposit.status, TransactionState::Completed);
    assert_eq!(deposit.credit_amount, dec!(5000));
    assert_eq!(deposit.order_id, None);

    let withdraw = service
        .create_transaction(user_1(), OrderType::Withdraw, dec!(2000))
        .await
        .unwrap();
    assert_eq!(withdraw.debit_amount, dec!(2000));

    let view = service.get_balance_view(user_1()).await.unwrap();
    assert_eq!(view.balance, INITIAL_BALANCE + dec!(3000));
    assert_eq!(view.available, view.balance);

    let stored = service.get_transaction(deposit.id()).await.unwrap();
    assert_eq!(stored.status, TransactionState::Completed);
    assert_eq!(stored.version(), 2);
}

#[tokio::test]
async fn test_only_cash_types_can_be_posted_directly() {
    let service = funded_service().await;

    for order_type in [OrderType::Buy, OrderType::Sell, OrderType::Fee, OrderType::Tax] {
        let err = service
            .create_transaction(user_1(), order_type, dec!(10))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnknownOrderType(_)), "unexpected error: {err}");
    }

    let err = service
        .create_transaction(user_1(), OrderType::Deposit, dec!(0))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidRequest(_)));
    assert_eq!(count(&service, "transactions").await, 0);
}

/// Test: cash amounts beyond the accepted range never reach the balance
#[tokio::test]
async fn test_oversized_amounts_are_rejected() {
    let service = funded_service().await;

    for amount in [MAX_AMOUNT + dec!(1), Decimal::MAX] {
        let err = service
            .create_transaction(user_1(), OrderType::Deposit, amount)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidRequest(_)), "unexpected error: {err}");
    }

    let err = service.open_account(user_2(), Decimal::MAX).await.unwrap_err();
    assert!(matches!(err, LedgerError::InvalidRequest(_)), "unexpected error: {err}");

    assert_eq!(count(&service, "transactions").await, 0);
    let view = service.get_balance_view(user_1()).await.unwrap();
    assert_eq!(view.balance, INITIAL_BALANCE);

    service
        .create_transaction(user_1(), OrderType::Deposit, MAX_AMOUNT)
        .await
        .unwrap();
    let view = service.get_balance_view(user_1()).await.unwrap();
    assert_eq!(view.balance, INITIAL_BALANCE + MAX_AMOUNT);
}

#[tokio::test]
async fn test_unknown_transaction() {
    let service = funded_service().await;
    let err = service.get_transaction(user_2()).await.unwrap_err();
    assert!(matches!(err, LedgerError::AggregateNotFound(_)));
}

#[tokio::test]
async fn test_list_transactions_is_half_open_and_newest_first() {
    let clock = fixed_clock();
    let service = service_with(memory_pool().await, clock.clone(), StaticPriceSource::new());
    service.open_account(user_1(), INITIAL_BALANCE).await.unwrap();
    let start = fixed_timestamp();

    let first = service
        .create_transaction(user_1(), OrderType::Deposit, dec!(100))
        .await
        .unwrap();
    clock.advance(ChronoDuration::hours(1));
    let second = service
        .create_transaction(user_1(), OrderType::Deposit, dec!(200))
        .await
        .unwrap();
    clock.advance(ChronoDuration::hours(1));
    let third = service
        .create_transaction(user_1(), OrderType::Withdraw, dec!(50))
        .await
        .unwrap();

    let first_hour = service
        .list_transactions(user_1(), start, start + ChronoDuration::hours(1))
        .await
        .unwrap();
    assert_eq!(first_hour.iter().map(|t| t.id()).collect::<Vec<_>>(), vec![first.id()]);

    let all = service
        .list_transactions(user_1(), start, start + ChronoDuration::hours(3))
        .await
        .unwrap();
    assert_eq!(
        all.iter().map(|t| t.id()).collect::<Vec<_>>(),
        vec![third.id(), second.id(), first.id()]
    );

    let err = service
        .list_transactions(user_1(), start + ChronoDuration::hours(1), start)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_balance_history_records_every_movement() {
    let service = funded_service().await;
    service.create_order(buy(2, dec!(84.90), 11)).await.unwrap();

    let history = service.balance_history(user_1()).await.unwrap();

    let rows: Vec<_> = history
        .iter()
        .map(|h| (h.version, h.order_type, h.available_delta, h.pending_delta))
        .collect();
    assert_eq!(
        rows,
        vec![
            (2, OrderType::Buy, dec!(-169800), dec!(169800)),
            (3, OrderType::Buy, dec!(0), dec!(-169800)),
            (4, OrderType::Fee, dec!(-60.49125), dec!(60.49125)),
            (5, OrderType::Fee, dec!(0), dec!(-60.49125)),
        ]
    );

    let moved: rust_decimal::Decimal = history
        .iter()
        .map(|h| h.available_delta + h.pending_delta)
        .sum();
    let view = service.get_balance_view(user_1()).await.unwrap();
    assert_eq!(INITIAL_BALANCE + moved, view.balance);
}

// ============================================================================
// Deadlines
// ============================================================================

#[tokio::test]
async fn test_timed_out_operation_is_rolled_back() {
    let mut service = service()
        .await
        .with_operation_timeout(Duration::from_millis(50));
    service.add_balance_projector(BALANCE_CREATED, Arc::new(Stall));

    let err = service.open_account(user_1(), INITIAL_BALANCE).await.unwrap_err();

    assert!(
        matches!(err, LedgerError::Timeout { operation: "open_account", .. }),
        "unexpected error: {err}"
    );
    let err = service.get_balance_view(user_1()).await.unwrap_err();
    assert!(matches!(err, LedgerError::AggregateNotFound(_)));
    assert_eq!(count(&service, "balance_events").await, 0);
}
