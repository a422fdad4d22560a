// Copyright (c) 2025 - Cowboy AI, Inc.
//! Ledger aggregate lifecycles
//!
//! ```text
//! Order:        init ──created──▶ created ──changed──▶ changed ─┬─changed─┐
//!                                                               │◀────────┘
//!                                                               └─closed──▶ closed
//!
//! Transaction:  init ──created──▶ created ─┬─completed──▶ completed
//!                                          └─failed─────▶ failed
//!
//! Balance:      init ──created──▶ created ◀─changed─┐
//!                                    └──────────────┘
//! ```
//!
//! The initial state is the empty tag `""` in storage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Transition;
use crate::errors::LedgerError;
use crate::events::balance::{BALANCE_CHANGED, BALANCE_CREATED};
use crate::events::order::{ORDER_CHANGED, ORDER_CLOSED, ORDER_CREATED};
use crate::events::transaction::{TRANSACTION_COMPLETED, TRANSACTION_CREATED, TRANSACTION_FAILED};

macro_rules! lifecycle_state {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident => $tag:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub enum $name {
            #[default]
            $( $variant, )+
        }

        impl $name {
            /// Storage tag
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $tag, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = LedgerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $tag => Ok(Self::$variant), )+
                    other => Err(LedgerError::SnapshotDecode {
                        column: "status",
                        reason: format!("unknown {} {:?}", stringify!($name), other),
                    }),
                }
            }
        }
    };
}

lifecycle_state! {
    /// Order lifecycle
    pub enum OrderState {
        Init => "",
        Created => "created",
        Changed => "changed",
        Closed => "closed",
    }
}

lifecycle_state! {
    /// Transaction lifecycle
    pub enum TransactionState {
        Init => "",
        Created => "created",
        Completed => "completed",
        Failed => "failed",
    }
}

lifecycle_state! {
    /// BalanceView lifecycle
    pub enum BalanceState {
        Init => "",
        Created => "created",
    }
}

impl OrderState {
    /// Still accepting fills
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Created | Self::Changed)
    }
}

pub(crate) const ORDER_TRANSITIONS: &[Transition<OrderState>] = &[
    Transition::new(OrderState::Init, ORDER_CREATED, OrderState::Created),
    Transition::new(OrderState::Created, ORDER_CHANGED, OrderState::Changed),
    Transition::new(OrderState::Changed, ORDER_CHANGED, OrderState::Changed),
    Transition::new(OrderState::Changed, ORDER_CLOSED, OrderState::Closed),
];

pub(crate) const TRANSACTION_TRANSITIONS: &[Transition<TransactionState>] = &[
    Transition::new(TransactionState::Init, TRANSACTION_CREATED, TransactionState::Created),
    Transition::new(TransactionState::Created, TRANSACTION_COMPLETED, TransactionState::Completed),
    Transition::new(TransactionState::Created, TRANSACTION_FAILED, TransactionState::Failed),
];

pub(crate) const BALANCE_TRANSITIONS: &[Transition<BalanceState>] = &[
    Transition::new(BalanceState::Init, BALANCE_CREATED, BalanceState::Created),
    Transition::new(BalanceState::Created, BALANCE_CHANGED, BalanceState::Created),
];
