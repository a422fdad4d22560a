// Copyright (c) 2025 - Cowboy AI, Inc.
//! Transaction Aggregate
//!
//! A single cash movement for one user: the principal, tax or fee of a
//! trade, or a deposit or withdrawal. Postings complete immediately; there
//! is no external settlement step.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{Aggregate, AggregateRoot};
use crate::domain::OrderType;
use crate::errors::LedgerResult;
use crate::events::{Event, TransactionCompleted, TransactionCreated, TransactionEvent, TransactionFailed};
use crate::state_machine::ledger_lifecycle::TRANSACTION_TRANSITIONS;
use crate::state_machine::{StateMachine, TransactionState, Transition};

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    root: AggregateRoot<TransactionEvent>,
    pub user_id: Uuid,
    /// Trade this movement belongs to, absent for deposits and withdrawals
    pub order_id: Option<Uuid>,
    pub order_type: OrderType,
    pub credit_amount: Decimal,
    pub debit_amount: Decimal,
    pub status: TransactionState,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn new(
        id: Uuid,
        user_id: Uuid,
        order_id: Option<Uuid>,
        order_type: OrderType,
        credit_amount: Decimal,
        debit_amount: Decimal,
        now: DateTime<Utc>,
    ) -> LedgerResult<Self> {
        let mut transaction = Self::empty(id);
        transaction.record(
            user_id,
            now,
            TransactionCreated {
                user_id,
                order_id,
                order_type,
                credit_amount,
                debit_amount,
            },
        )?;
        Ok(transaction)
    }

    /// Money in, credited to the user
    pub fn credit(
        id: Uuid,
        user_id: Uuid,
        order_id: Option<Uuid>,
        order_type: OrderType,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> LedgerResult<Self> {
        Self::new(id, user_id, order_id, order_type, amount, Decimal::ZERO, now)
    }

    /// Money out, debited from the user
    pub fn debit(
        id: Uuid,
        user_id: Uuid,
        order_id: Option<Uuid>,
        order_type: OrderType,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> LedgerResult<Self> {
        Self::new(id, user_id, order_id, order_type, Decimal::ZERO, amount, now)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        id: Uuid,
        version: u64,
        user_id: Uuid,
        order_id: Option<Uuid>,
        order_type: OrderType,
        credit_amount: Decimal,
        debit_amount: Decimal,
        status: TransactionState,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            root: AggregateRoot::restored(id, version),
            user_id,
            order_id,
            order_type,
            credit_amount,
            debit_amount,
            status,
            created_at: Some(created_at),
            updated_at: Some(updated_at),
        }
    }

    pub fn complete(&mut self, now: DateTime<Utc>) -> LedgerResult<()> {
        self.record(self.user_id, now, TransactionCompleted {})
    }

    pub fn fail(&mut self, reason: Option<String>, now: DateTime<Utc>) -> LedgerResult<()> {
        self.record(self.user_id, now, TransactionFailed { reason })
    }

    /// Signed amount, credit minus debit
    pub fn amount(&self) -> Decimal {
        self.credit_amount - self.debit_amount
    }
}

impl StateMachine for Transaction {
    type State = TransactionState;
    type Event = TransactionEvent;

    fn current_state(&self) -> TransactionState {
        self.status
    }

    fn transitions() -> &'static [Transition<TransactionState>] {
        TRANSACTION_TRANSITIONS
    }
}

impl Aggregate for Transaction {
    const EVENT_TABLE: &'static str = "transaction_events";

    fn empty(id: Uuid) -> Self {
        Self {
            root: AggregateRoot::new(id),
            user_id: Uuid::nil(),
            order_id: None,
            order_type: OrderType::Deposit,
            credit_amount: Decimal::ZERO,
            debit_amount: Decimal::ZERO,
            status: TransactionState::Init,
            created_at: None,
            updated_at: None,
        }
    }

    fn root(&self) -> &AggregateRoot<TransactionEvent> {
        &self.root
    }

    fn root_mut(&mut self) -> &mut AggregateRoot<TransactionEvent> {
        &mut self.root
    }

    fn evolve(&mut self, event: &Event<TransactionEvent>, next: TransactionState) {
        if let TransactionEvent::Created(created) = &event.payload {
            self.user_id = created.user_id;
            self.order_id = created.order_id;
            self.order_type = created.order_type;
            self.credit_amount = created.credit_amount;
            self.debit_amount = created.debit_amount;
            self.created_at = Some(event.created_at);
        }
        self.status = next;
        self.updated_at = Some(event.created_at);
    }
}
