// Copyright (c) 2025 - Cowboy AI, Inc.
//! Ledger Service
//!
//! Books fills against a user's positions and posts every resulting cash
//! movement to the user's balance.
//!
//! # Chained Posting
//!
//! ```text
//! begin ─▶ lock balance ─▶ for each transaction:            ─▶ save balance ─▶ commit
//!                             complete ─▶ save ─▶ post funds
//! ```
//!
//! All of it runs in one store transaction. The balance lock is taken
//! first, so concurrent operations on the same user queue up behind it,
//! and any failing step rolls back every order, transaction and balance
//! change made by the operation.
//!
//! # Booking a Fill
//!
//! A fill first closes out open orders on the opposite side, oldest first.
//! Whatever quantity is left over opens a new order. Each touched order
//! gets its own principal, tax and fee chain.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::requests::CreateOrderRequest;
use crate::aggregate::{Aggregate, BalanceView, Order, Transaction};
use crate::clock::{Clock, SystemClock};
use crate::config::LedgerConfig;
use crate::domain::fees;
use crate::domain::{OrderSide, OrderType};
use crate::errors::{LedgerError, LedgerResult};
use crate::events::balance::BALANCE_CHANGED;
use crate::events::EventType;
use crate::ids::{IdGenerator, UuidV7Generator};
use crate::prices::{PriceSource, StaticPriceSource};
use crate::projection::Projector;
use crate::repository::AggregateRepository;
use crate::store::{
    self, BalanceHistoryEntry, BalanceHistoryProjector, OrderFilter, SqliteBalanceViewStore,
    SqliteOrderStore, SqliteTransactionStore,
};

type StoreTransaction = sqlx::Transaction<'static, Sqlite>;

/// Application service over the ledger store
pub struct LedgerService {
    pool: SqlitePool,
    orders: AggregateRepository<Order>,
    transactions: AggregateRepository<Transaction>,
    balances: AggregateRepository<BalanceView>,
    order_store: Arc<SqliteOrderStore>,
    transaction_store: Arc<SqliteTransactionStore>,
    history: Arc<BalanceHistoryProjector>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    prices: Arc<dyn PriceSource>,
    operation_timeout: Duration,
}

impl LedgerService {
    /// Service over an already migrated pool
    pub fn new(pool: SqlitePool) -> Self {
        let order_store = Arc::new(SqliteOrderStore::new());
        let transaction_store = Arc::new(SqliteTransactionStore::new());
        let balance_store = Arc::new(SqliteBalanceViewStore::new());
        let history = Arc::new(BalanceHistoryProjector::new());

        let orders = AggregateRepository::<Order>::sqlite()
            .with_loader(order_store.clone())
            .with_saver(order_store.clone());
        let transactions = AggregateRepository::<Transaction>::sqlite()
            .with_loader(transaction_store.clone())
            .with_saver(transaction_store.clone());
        let balances = AggregateRepository::<BalanceView>::sqlite()
            .with_loader(balance_store.clone())
            .with_saver(balance_store)
            .with_projector(BALANCE_CHANGED, history.clone());

        Self {
            pool,
            orders,
            transactions,
            balances,
            order_store,
            transaction_store,
            history,
            ids: Arc::new(UuidV7Generator),
            clock: Arc::new(SystemClock),
            prices: Arc::new(StaticPriceSource::new()),
            operation_timeout: LedgerConfig::default().operation_timeout,
        }
    }

    /// Connect, migrate and build a service for `config`
    pub async fn connect(config: &LedgerConfig) -> LedgerResult<Self> {
        let pool = store::connect(config).await?;
        Ok(Self::new(pool).with_operation_timeout(config.operation_timeout))
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_price_source(mut self, prices: Arc<dyn PriceSource>) -> Self {
        self.prices = prices;
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn add_order_projector(&mut self, event_type: EventType, projector: Arc<dyn Projector<Order>>) {
        self.orders.add_projector(event_type, projector);
    }

    pub fn add_transaction_projector(
        &mut self,
        event_type: EventType,
        projector: Arc<dyn Projector<Transaction>>,
    ) {
        self.transactions.add_projector(event_type, projector);
    }

    pub fn add_balance_projector(
        &mut self,
        event_type: EventType,
        projector: Arc<dyn Projector<BalanceView>>,
    ) {
        self.balances.add_projector(event_type, projector);
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Open the balance of `user_id` with `initial_balance` available
    ///
    /// # Errors
    ///
    /// `EventVersionConflict` when the user already has a balance,
    /// `InvalidRequest` when the initial balance exceeds [`fees::MAX_AMOUNT`].
    #[instrument(skip(self))]
    pub async fn open_account(&self, user_id: Uuid, initial_balance: Decimal) -> LedgerResult<BalanceView> {
        if initial_balance.abs() > fees::MAX_AMOUNT {
            return Err(LedgerError::InvalidRequest(format!(
                "initial balance {initial_balance} exceeds {}",
                fees::MAX_AMOUNT
            )));
        }

        self.bounded("open_account", async {
            let mut tx = self.begin().await?;
            let mut view = BalanceView::open(user_id, initial_balance, self.clock.now())?;
            self.balances.save(&mut *tx, &mut view).await?;
            commit(tx, "open account").await?;

            info!(%user_id, "opened account");
            Ok(view)
        })
        .await
    }

    /// Book a fill and post its principal, tax and fee
    ///
    /// Returns every order the fill touched, merged ones first.
    ///
    /// # Errors
    ///
    /// - `InvalidOrder` for a malformed request
    /// - `AggregateNotFound` when the user has no balance
    /// - any step failure of the chain, after which nothing was written
    #[instrument(
        skip(self, request),
        fields(user_id = %request.user_id, stock_id = %request.stock_id, side = %request.side)
    )]
    pub async fn create_order(&self, request: CreateOrderRequest) -> LedgerResult<Vec<Order>> {
        request.validate()?;

        self.bounded("create_order", async {
            let now = self.clock.now();
            let mut tx = self.begin().await?;
            let mut balance = self.balances.load_for_update(&mut *tx, request.user_id).await?;

            let open = self
                .order_store
                .list_open_orders(&mut *tx, request.user_id, &request.stock_id, request.side)
                .await?;

            let mut fills: Vec<(Order, u64)> = Vec::new();
            let mut remaining = request.quantity;
            for mut order in open {
                if remaining == 0 {
                    break;
                }
                let merged = remaining.min(order.unmatched_quantity());
                let (held_price, held_quantity) = order.side(request.side);
                let price = fees::weighted_average_price(held_price, held_quantity, request.price, merged);
                order.change(request.side, price, held_quantity + merged, request.trade_date, now)?;
                debug!(order_id = %order.id(), merged, status = %order.status, "merged fill into open order");

                remaining -= merged;
                fills.push((order, merged));
            }

            if remaining > 0 {
                let order = Order::new(
                    self.ids.next_id(),
                    request.user_id,
                    request.stock_id.as_str(),
                    request.side,
                    request.price,
                    remaining,
                    request.trade_date,
                    now,
                )?;
                debug!(order_id = %order.id(), quantity = remaining, "opened order");
                fills.push((order, remaining));
            }

            let mut chain = Vec::new();
            for (order, quantity) in &fills {
                chain.extend(self.fill_chain(order, request.side, request.price, *quantity, now)?);
            }

            for (order, _) in &mut fills {
                self.orders.save(&mut *tx, order).await?;
            }
            self.post_chain(&mut *tx, &mut balance, chain, now).await?;
            commit(tx, "create order").await?;

            info!(
                orders = fills.len(),
                available = %balance.available,
                "booked fill"
            );
            Ok(fills.into_iter().map(|(order, _)| order).collect())
        })
        .await
    }

    /// Post a deposit or withdrawal
    ///
    /// # Errors
    ///
    /// `UnknownOrderType` for anything but Deposit and Withdraw,
    /// `InvalidRequest` for a non-positive amount or one above
    /// [`fees::MAX_AMOUNT`].
    #[instrument(skip(self))]
    pub async fn create_transaction(
        &self,
        user_id: Uuid,
        order_type: OrderType,
        amount: Decimal,
    ) -> LedgerResult<Transaction> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidRequest(format!(
                "amount must be positive, got {amount}"
            )));
        }
        if amount > fees::MAX_AMOUNT {
            return Err(LedgerError::InvalidRequest(format!(
                "amount {amount} exceeds {}",
                fees::MAX_AMOUNT
            )));
        }

        self.bounded("create_transaction", async {
            let now = self.clock.now();
            let id = self.ids.next_id();
            let transaction = match order_type {
                OrderType::Deposit => Transaction::credit(id, user_id, None, order_type, amount, now)?,
                OrderType::Withdraw => Transaction::debit(id, user_id, None, order_type, amount, now)?,
                other => return Err(LedgerError::UnknownOrderType(other.as_str().to_string())),
            };

            let mut tx = self.begin().await?;
            let mut balance = self.balances.load_for_update(&mut *tx, user_id).await?;
            let mut posted = self
                .post_chain(&mut *tx, &mut balance, vec![transaction], now)
                .await?;
            commit(tx, "create transaction").await?;

            posted
                .pop()
                .ok_or_else(|| LedgerError::InvalidRequest("empty posting chain".to_string()))
        })
        .await
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Orders matching `filter`, newest first, each with its profit and loss
    ///
    /// Closed orders carry the realized result. Open orders are valued at
    /// the latest known price of their symbol and left without a result
    /// when none is known.
    #[instrument(skip(self, filter), fields(user_id = %filter.user_id))]
    pub async fn list_orders(&self, filter: OrderFilter) -> LedgerResult<Vec<Order>> {
        let mut orders = {
            let mut conn = self.acquire().await?;
            self.order_store.list_orders(&mut *conn, &filter).await?
        };
        self.enrich(&mut orders).await?;
        Ok(orders)
    }

    /// One order with its profit and loss
    #[instrument(skip(self))]
    pub async fn get_order(&self, id: Uuid) -> LedgerResult<Order> {
        let order = {
            let mut conn = self.acquire().await?;
            self.orders.load(&mut *conn, id).await?
        };
        let mut orders = vec![order];
        self.enrich(&mut orders).await?;
        orders.pop().ok_or(LedgerError::AggregateNotFound(id))
    }

    /// Open orders of `user_id` on `stock_id` that a fill on `side` would
    /// close, oldest first
    #[instrument(skip(self))]
    pub async fn list_open_orders(
        &self,
        user_id: Uuid,
        stock_id: &str,
        side: OrderSide,
    ) -> LedgerResult<Vec<Order>> {
        let mut conn = self.acquire().await?;
        self.order_store
            .list_open_orders(&mut *conn, user_id, stock_id, side)
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_transaction(&self, id: Uuid) -> LedgerResult<Transaction> {
        let mut conn = self.acquire().await?;
        self.transactions.load(&mut *conn, id).await
    }

    /// Transactions of `user_id` created in `[start, end)`, newest first
    #[instrument(skip(self))]
    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> LedgerResult<Vec<Transaction>> {
        if start > end {
            return Err(LedgerError::InvalidRequest(format!(
                "range start {start} is after end {end}"
            )));
        }
        let mut conn = self.acquire().await?;
        self.transaction_store
            .list_transactions(&mut *conn, user_id, start, end)
            .await
    }

    /// Transactions posted for one order, in posting order
    #[instrument(skip(self))]
    pub async fn list_order_transactions(&self, order_id: Uuid) -> LedgerResult<Vec<Transaction>> {
        let mut conn = self.acquire().await?;
        self.transaction_store.list_for_order(&mut *conn, order_id).await
    }

    #[instrument(skip(self))]
    pub async fn get_balance_view(&self, user_id: Uuid) -> LedgerResult<BalanceView> {
        let mut conn = self.acquire().await?;
        self.balances.load(&mut *conn, user_id).await
    }

    /// Every bucket movement of `user_id`, oldest first
    #[instrument(skip(self))]
    pub async fn balance_history(&self, user_id: Uuid) -> LedgerResult<Vec<BalanceHistoryEntry>> {
        let mut conn = self.acquire().await?;
        self.history.list(&mut *conn, user_id).await
    }

    // ========================================================================
    // Posting
    // ========================================================================

    /// Principal, tax and fee of `quantity` lots filled at `price` on `order`
    ///
    /// Tax applies once the order holds both sides, halved for a day trade.
    fn fill_chain(
        &self,
        order: &Order,
        side: OrderSide,
        price: Decimal,
        quantity: u64,
        now: DateTime<Utc>,
    ) -> LedgerResult<Vec<Transaction>> {
        let principal = fees::principal(price, quantity);
        let user_id = order.user_id;
        let order_id = Some(order.id());

        let mut chain = Vec::with_capacity(3);
        chain.push(match side {
            OrderSide::Buy => {
                Transaction::debit(self.ids.next_id(), user_id, order_id, OrderType::Buy, principal, now)?
            }
            OrderSide::Sell => {
                Transaction::credit(self.ids.next_id(), user_id, order_id, OrderType::Sell, principal, now)?
            }
        });

        if order.buy_quantity > 0 && order.sell_quantity > 0 {
            let tax = fees::tax(principal, order.is_day_trade());
            chain.push(Transaction::debit(
                self.ids.next_id(),
                user_id,
                order_id,
                OrderType::Tax,
                tax,
                now,
            )?);
        }

        chain.push(Transaction::debit(
            self.ids.next_id(),
            user_id,
            order_id,
            OrderType::Fee,
            fees::fee(principal),
            now,
        )?);
        Ok(chain)
    }

    /// Complete, save and post each transaction, then save the balance
    ///
    /// `balance` must have been loaded for update on `conn`.
    async fn post_chain(
        &self,
        conn: &mut SqliteConnection,
        balance: &mut BalanceView,
        chain: Vec<Transaction>,
        now: DateTime<Utc>,
    ) -> LedgerResult<Vec<Transaction>> {
        let mut posted = Vec::with_capacity(chain.len());
        for mut transaction in chain {
            transaction.complete(now)?;
            self.transactions.save(&mut *conn, &mut transaction).await?;
            balance.post(&transaction, now)?;
            debug!(
                transaction_id = %transaction.id(),
                order_type = %transaction.order_type,
                amount = %transaction.amount(),
                "posted transaction"
            );
            posted.push(transaction);
        }
        self.balances.save(conn, balance).await?;
        Ok(posted)
    }

    async fn enrich(&self, orders: &mut [Order]) -> LedgerResult<()> {
        let open: Vec<String> = orders
            .iter()
            .filter(|order| !order.is_closed())
            .map(|order| order.stock_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let prices = if open.is_empty() {
            HashMap::new()
        } else {
            self.prices.latest_prices(&open).await?
        };

        for order in orders.iter_mut() {
            if order.is_closed() {
                order.calculate_profit_loss();
            } else if let Some(price) = prices.get(&order.stock_id) {
                order.calculate_unrealized_profit_loss(*price);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Plumbing
    // ========================================================================

    async fn begin(&self) -> LedgerResult<StoreTransaction> {
        self.pool
            .begin()
            .await
            .map_err(|e| LedgerError::transaction("begin", e))
    }

    async fn acquire(&self) -> LedgerResult<PoolConnection<Sqlite>> {
        self.pool
            .acquire()
            .await
            .map_err(|e| LedgerError::transaction("acquire connection", e))
    }

    /// Run `operation` under the operation deadline
    ///
    /// On expiry the future is dropped, which drops its open store
    /// transaction and rolls it back.
    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> LedgerResult<T>
    where
        F: Future<Output = LedgerResult<T>>,
    {
        match tokio::time::timeout(self.operation_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, after = ?self.operation_timeout, "operation timed out, rolled back");
                Err(LedgerError::Timeout {
                    operation,
                    after: self.operation_timeout,
                })
            }
        }
    }
}

async fn commit(tx: StoreTransaction, context: &str) -> LedgerResult<()> {
    tx.commit()
        .await
        .map_err(|e| LedgerError::transaction(format!("commit {context}"), e))
}
