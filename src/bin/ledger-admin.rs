// Copyright (c) 2025 - Cowboy AI, Inc.
//! Ledger Admin
//!
//! Operator commands against the ledger database.
//!
//! ```text
//! ledger-admin migrate
//! ledger-admin open-account <user-uuid> [initial-balance]
//! ledger-admin balance <user-uuid>
//! ```
//!
//! Configuration comes from the `LEDGER_*` environment variables
//! (`LEDGER_DATABASE_URL`, `LEDGER_LOG`, ...).

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use stock_ledger::{store, telemetry, LedgerConfig, LedgerService};
use tracing::info;
use uuid::Uuid;

const USAGE: &str = "usage: ledger-admin <migrate | open-account <user-uuid> [initial] | balance <user-uuid>>";

#[derive(Debug)]
enum Command {
    Migrate,
    OpenAccount { user_id: Uuid, initial: Decimal },
    Balance { user_id: Uuid },
}

impl Command {
    fn parse(args: &[String]) -> Result<Self> {
        match args {
            [cmd] if cmd == "migrate" => Ok(Command::Migrate),
            [cmd, user, rest @ ..] if cmd == "open-account" && rest.len() <= 1 => {
                let user_id = parse_user(user)?;
                let initial = match rest.first() {
                    Some(raw) => raw
                        .parse()
                        .with_context(|| format!("initial balance {raw:?} is not a decimal"))?,
                    None => Decimal::ZERO,
                };
                Ok(Command::OpenAccount { user_id, initial })
            }
            [cmd, user] if cmd == "balance" => Ok(Command::Balance {
                user_id: parse_user(user)?,
            }),
            _ => bail!(USAGE),
        }
    }
}

fn parse_user(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).with_context(|| format!("user id {raw:?} is not a UUID"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = LedgerConfig::from_env().context("reading LEDGER_* configuration")?;
    telemetry::init(&config.log_filter);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;

    match command {
        Command::Migrate => {
            // connect runs the migrations
            let pool = store::connect(&config)
                .await
                .with_context(|| format!("migrating {}", config.database_url))?;
            pool.close().await;
            info!(url = %config.database_url, "migrations applied");
        }
        Command::OpenAccount { user_id, initial } => {
            let service = LedgerService::connect(&config).await.context("connecting to ledger")?;
            let view = service
                .open_account(user_id, initial)
                .await
                .with_context(|| format!("opening account {user_id}"))?;
            println!("{user_id} balance={} currency={}", view.balance, view.currency);
        }
        Command::Balance { user_id } => {
            let service = LedgerService::connect(&config).await.context("connecting to ledger")?;
            let view = service
                .get_balance_view(user_id)
                .await
                .with_context(|| format!("loading balance of {user_id}"))?;
            println!(
                "{user_id} balance={} available={} pending={} currency={}",
                view.balance, view.available, view.pending, view.currency
            );
        }
    }

    Ok(())
}
