// Copyright (c) 2025 - Cowboy AI, Inc.
//! Order Aggregate
//!
//! One round-trip position per user and stock. The first fill opens the
//! order on one side; later fills on either side are merged in with
//! [`Order::change`]. Once both sides hold the same quantity the order
//! closes itself.
//!
//! # Profit and Loss
//!
//! ```text
//! spent    = Σ buy legs  (principal + fee)
//! received = Σ sell legs (principal − fee − tax)
//! result   = round(received − spent), percent = result / spent
//! ```
//!
//! A closed order has a realized result. An open one can be valued at a
//! market price, which closes the unmatched remainder at that price.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{Aggregate, AggregateRoot};
use crate::domain::fees::{self, ProfitLoss, ProfitLossAccumulator, ROUND_TRIP_LEGS};
use crate::domain::OrderSide;
use crate::errors::LedgerResult;
use crate::events::{Event, OrderChanged, OrderClosed, OrderCreated, OrderEvent};
use crate::state_machine::ledger_lifecycle::ORDER_TRANSITIONS;
use crate::state_machine::{OrderState, StateMachine, Transition};

/// Order aggregate state
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    root: AggregateRoot<OrderEvent>,

    /// Owner of the position
    pub user_id: Uuid,

    /// Exchange symbol
    pub stock_id: String,

    /// Average buy price per share
    pub buy_price: Decimal,

    /// Lots bought
    pub buy_quantity: u64,

    /// Exchange date of the latest buy fill
    pub buy_date: Option<NaiveDate>,

    /// Average sell price per share
    pub sell_price: Decimal,

    /// Lots sold
    pub sell_quantity: u64,

    /// Exchange date of the latest sell fill
    pub sell_date: Option<NaiveDate>,

    /// Break-even unit price fixed at creation
    pub profitable_price: Decimal,

    pub status: OrderState,

    /// Derived on read, never stored
    pub profit_loss: Option<ProfitLoss>,

    /// Market price used for the unrealized result
    pub current_price: Option<Decimal>,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Open a position with its first fill
    ///
    /// # Errors
    ///
    /// `InvalidEvent` for a non-positive price or quantity or an empty
    /// stock id.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Uuid,
        user_id: Uuid,
        stock_id: impl Into<String>,
        side: OrderSide,
        price: Decimal,
        quantity: u64,
        trade_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> LedgerResult<Self> {
        let mut order = Self::empty(id);
        let created = OrderCreated {
            user_id,
            stock_id: stock_id.into(),
            side,
            price,
            quantity,
            trade_date,
            profitable_price: profitable_price(side, price, quantity),
        };
        order.record(user_id, now, created)?;
        Ok(order)
    }

    /// Rebuild from a snapshot row
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        id: Uuid,
        version: u64,
        user_id: Uuid,
        stock_id: String,
        buy: (Decimal, u64, Option<NaiveDate>),
        sell: (Decimal, u64, Option<NaiveDate>),
        profitable_price: Decimal,
        status: OrderState,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            root: AggregateRoot::restored(id, version),
            user_id,
            stock_id,
            buy_price: buy.0,
            buy_quantity: buy.1,
            buy_date: buy.2,
            sell_price: sell.0,
            sell_quantity: sell.1,
            sell_date: sell.2,
            profitable_price,
            status,
            profit_loss: None,
            current_price: None,
            created_at: Some(created_at),
            updated_at: Some(updated_at),
        }
    }

    /// Set one side to `quantity` lots at `price`, closing on a match
    ///
    /// # Errors
    ///
    /// `NoTransition` when the order is not open.
    pub fn change(
        &mut self,
        side: OrderSide,
        price: Decimal,
        quantity: u64,
        trade_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> LedgerResult<()> {
        let changed = OrderChanged {
            side,
            price,
            quantity,
            trade_date,
        };
        self.record(self.user_id, now, changed)?;

        if self.buy_quantity == self.sell_quantity {
            self.record(self.user_id, now, OrderClosed {})?;
        }
        Ok(())
    }

    /// Price and quantity held on `side`
    pub fn side(&self, side: OrderSide) -> (Decimal, u64) {
        match side {
            OrderSide::Buy => (self.buy_price, self.buy_quantity),
            OrderSide::Sell => (self.sell_price, self.sell_quantity),
        }
    }

    /// Lots on the larger side not yet matched by the other
    pub fn unmatched_quantity(&self) -> u64 {
        self.buy_quantity.abs_diff(self.sell_quantity)
    }

    /// Both legs settled on the same exchange date
    pub fn is_day_trade(&self) -> bool {
        self.buy_date.is_some() && self.buy_date == self.sell_date
    }

    pub fn is_closed(&self) -> bool {
        self.status == OrderState::Closed
    }

    /// Realized result of a fully matched order
    ///
    /// Leaves `profit_loss` untouched unless both sides hold the same
    /// non-zero quantity.
    pub fn calculate_profit_loss(&mut self) -> Option<ProfitLoss> {
        if self.buy_quantity == 0 || self.buy_quantity != self.sell_quantity {
            return None;
        }
        let mut acc = ProfitLossAccumulator::new(self.is_day_trade());
        acc.buy(self.buy_price, self.buy_quantity)
            .sell(self.sell_price, self.sell_quantity);
        self.profit_loss = Some(acc.profit_loss());
        self.profit_loss
    }

    /// Result of an open order if the remainder closed at `current_price`
    pub fn calculate_unrealized_profit_loss(&mut self, current_price: Decimal) -> Option<ProfitLoss> {
        self.current_price = Some(current_price);

        let mut acc = ProfitLossAccumulator::new(false);
        if self.buy_quantity > self.sell_quantity {
            acc.buy(self.buy_price, self.buy_quantity);
            if self.sell_quantity > 0 {
                acc.sell(self.sell_price, self.sell_quantity);
                acc.sell(current_price, self.buy_quantity - self.sell_quantity);
            } else {
                acc.sell(current_price, self.buy_quantity);
            }
        } else if self.sell_quantity > self.buy_quantity {
            acc.sell(self.sell_price, self.sell_quantity);
            if self.buy_quantity > 0 {
                acc.buy(self.buy_price, self.buy_quantity);
                acc.buy(current_price, self.sell_quantity - self.buy_quantity);
            } else {
                acc.buy(current_price, self.sell_quantity);
            }
        } else {
            return self.calculate_profit_loss();
        }

        self.profit_loss = Some(acc.profit_loss());
        self.profit_loss
    }
}

/// Break-even unit price of a fill, covering both legs' fees and the tax
pub fn profitable_price(side: OrderSide, price: Decimal, quantity: u64) -> Decimal {
    if quantity == 0 {
        return price;
    }
    let principal = fees::principal(price, quantity);
    let fee = fees::fee(principal) * ROUND_TRIP_LEGS;
    let tax = fees::tax(principal, false);
    let lots = Decimal::from(quantity) * fees::LOT_SIZE;

    let break_even = match side {
        OrderSide::Buy => (principal + fee + tax) / lots,
        OrderSide::Sell => (principal - fee - tax) / lots,
    };
    fees::round_price(break_even)
}

impl StateMachine for Order {
    type State = OrderState;
    type Event = OrderEvent;

    fn current_state(&self) -> OrderState {
        self.status
    }

    fn transitions() -> &'static [Transition<OrderState>] {
        ORDER_TRANSITIONS
    }
}

impl Aggregate for Order {
    const EVENT_TABLE: &'static str = "order_events";

    fn empty(id: Uuid) -> Self {
        Self {
            root: AggregateRoot::new(id),
            user_id: Uuid::nil(),
            stock_id: String::new(),
            buy_price: Decimal::ZERO,
            buy_quantity: 0,
            buy_date: None,
            sell_price: Decimal::ZERO,
            sell_quantity: 0,
            sell_date: None,
            profitable_price: Decimal::ZERO,
            status: OrderState::Init,
            profit_loss: None,
            current_price: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn root(&self) -> &AggregateRoot<OrderEvent> {
        &self.root
    }

    fn root_mut(&mut self) -> &mut AggregateRoot<OrderEvent> {
        &mut self.root
    }

    fn evolve(&mut self, event: &Event<OrderEvent>, next: OrderState) {
        match &event.payload {
            OrderEvent::Created(created) => {
                self.user_id = created.user_id;
                self.stock_id = created.stock_id.clone();
                self.profitable_price = created.profitable_price;
                self.set_side(created.side, created.price, created.quantity, created.trade_date);
                self.created_at = Some(event.created_at);
            }
            OrderEvent::Changed(changed) => {
                self.set_side(changed.side, changed.price, changed.quantity, changed.trade_date);
            }
            OrderEvent::Closed(_) => {}
        }
        self.status = next;
        self.updated_at = Some(event.created_at);
    }
}

impl Order {
    fn set_side(&mut self, side: OrderSide, price: Decimal, quantity: u64, date: NaiveDate) {
        match side {
            OrderSide::Buy => {
                self.buy_price = price;
                self.buy_quantity = quantity;
                self.buy_date = Some(date);
            }
            OrderSide::Sell => {
                self.sell_price = price;
                self.sell_quantity = quantity;
                self.sell_date = Some(date);
            }
        }
    }
}
