// Copyright (c) 2025 - Cowboy AI, Inc.
//! BalanceView Aggregate
//!
//! Per-user cash ledger split into two buckets:
//!
//! ```text
//! balance = available + pending
//! ```
//!
//! Every mutation is a `balance.changed` event carrying the two bucket
//! deltas; the total moves by their sum. The four fund movements below are
//! the only producers of those events.
//!
//! | movement                     | available | pending |
//! |------------------------------|-----------|---------|
//! | `move_available_to_pending`  | −\|a\|    | +\|a\|  |
//! | `move_pending_to_available`  | +\|a\|    | −\|a\|  |
//! | `credit_pending`             | 0         | +\|a\|  |
//! | `debit_pending`              | 0         | −\|a\|  |

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{Aggregate, AggregateRoot, Transaction};
use crate::domain::CURRENCY;
use crate::errors::{LedgerError, LedgerResult};
use crate::events::{BalanceChanged, BalanceCreated, BalanceEvent, Event};
use crate::state_machine::ledger_lifecycle::BALANCE_TRANSITIONS;
use crate::state_machine::{BalanceState, StateMachine, Transition};

#[derive(Debug, Clone, PartialEq)]
pub struct BalanceView {
    root: AggregateRoot<BalanceEvent>,
    pub balance: Decimal,
    pub available: Decimal,
    pub pending: Decimal,
    pub currency: String,
    pub status: BalanceState,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl BalanceView {
    /// Open the ledger of `user_id`; the view shares the user's id
    pub fn open(user_id: Uuid, initial_balance: Decimal, now: DateTime<Utc>) -> LedgerResult<Self> {
        let mut view = Self::empty(user_id);
        view.record(
            user_id,
            now,
            BalanceCreated {
                initial_balance,
                currency: CURRENCY.to_string(),
            },
        )?;
        Ok(view)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        id: Uuid,
        version: u64,
        balance: Decimal,
        available: Decimal,
        pending: Decimal,
        currency: String,
        status: BalanceState,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            root: AggregateRoot::restored(id, version),
            balance,
            available,
            pending,
            currency,
            status,
            created_at: Some(created_at),
            updated_at: Some(updated_at),
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.id()
    }

    pub fn move_available_to_pending(&mut self, transaction: &Transaction, now: DateTime<Utc>) -> LedgerResult<()> {
        let amount = transaction.amount().abs();
        self.change(transaction, -amount, amount, now)
    }

    pub fn move_pending_to_available(&mut self, transaction: &Transaction, now: DateTime<Utc>) -> LedgerResult<()> {
        let amount = transaction.amount().abs();
        self.change(transaction, amount, -amount, now)
    }

    pub fn credit_pending(&mut self, transaction: &Transaction, now: DateTime<Utc>) -> LedgerResult<()> {
        let amount = transaction.amount().abs();
        self.change(transaction, Decimal::ZERO, amount, now)
    }

    pub fn debit_pending(&mut self, transaction: &Transaction, now: DateTime<Utc>) -> LedgerResult<()> {
        let amount = transaction.amount().abs();
        self.change(transaction, Decimal::ZERO, -amount, now)
    }

    /// Post a completed transaction as its pair of bucket movements
    ///
    /// Outflows reserve the money and then remove it from pending; inflows
    /// land in pending and are then released to available.
    pub fn post(&mut self, transaction: &Transaction, now: DateTime<Utc>) -> LedgerResult<()> {
        if transaction.order_type.is_outflow() {
            self.move_available_to_pending(transaction, now)?;
            self.debit_pending(transaction, now)
        } else {
            self.credit_pending(transaction, now)?;
            self.move_pending_to_available(transaction, now)
        }
    }

    fn change(
        &mut self,
        transaction: &Transaction,
        available_delta: Decimal,
        pending_delta: Decimal,
        now: DateTime<Utc>,
    ) -> LedgerResult<()> {
        let fits = self
            .available
            .checked_add(available_delta)
            .zip(self.pending.checked_add(pending_delta))
            .and_then(|(available, pending)| available.checked_add(pending));
        if fits.is_none() {
            return Err(LedgerError::InvalidRequest(format!(
                "posting {} would overflow the balance of {}",
                transaction.amount(),
                self.id()
            )));
        }

        let changed = BalanceChanged {
            available_delta,
            pending_delta,
            amount: transaction.amount(),
            currency: self.currency.clone(),
            transaction_id: transaction.id(),
            order_type: transaction.order_type,
        };
        self.record(self.id(), now, changed)
    }
}

impl StateMachine for BalanceView {
    type State = BalanceState;
    type Event = BalanceEvent;

    fn current_state(&self) -> BalanceState {
        self.status
    }

    fn transitions() -> &'static [Transition<BalanceState>] {
        BALANCE_TRANSITIONS
    }
}

impl Aggregate for BalanceView {
    const EVENT_TABLE: &'static str = "balance_events";

    fn empty(id: Uuid) -> Self {
        Self {
            root: AggregateRoot::new(id),
            balance: Decimal::ZERO,
            available: Decimal::ZERO,
            pending: Decimal::ZERO,
            currency: String::new(),
            status: BalanceState::Init,
            created_at: None,
            updated_at: None,
        }
    }

    fn root(&self) -> &AggregateRoot<BalanceEvent> {
        &self.root
    }

    fn root_mut(&mut self) -> &mut AggregateRoot<BalanceEvent> {
        &mut self.root
    }

    fn evolve(&mut self, event: &Event<BalanceEvent>, next: BalanceState) {
        match &event.payload {
            BalanceEvent::Created(created) => {
                self.balance = created.initial_balance;
                self.available = created.initial_balance;
                self.pending = Decimal::ZERO;
                self.currency = created.currency.clone();
                self.created_at = Some(event.created_at);
            }
            BalanceEvent::Changed(changed) => {
                self.available += changed.available_delta;
                self.pending += changed.pending_delta;
                self.balance += changed.available_delta + changed.pending_delta;
            }
        }
        self.status = next;
        self.updated_at = Some(event.created_at);
    }
}
