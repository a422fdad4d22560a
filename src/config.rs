// Copyright (c) 2025 - Cowboy AI, Inc.

//! Ledger configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, LedgerResult};

pub const ENV_DATABASE_URL: &str = "LEDGER_DATABASE_URL";
pub const ENV_MAX_CONNECTIONS: &str = "LEDGER_MAX_CONNECTIONS";
pub const ENV_BUSY_TIMEOUT_MS: &str = "LEDGER_BUSY_TIMEOUT_MS";
pub const ENV_OPERATION_TIMEOUT_MS: &str = "LEDGER_OPERATION_TIMEOUT_MS";
pub const ENV_LOG: &str = "LEDGER_LOG";

/// Store and runtime settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// SQLite URL (e.g., "sqlite://ledger.db?mode=rwc")
    pub database_url: String,

    /// Pool size
    pub max_connections: u32,

    /// How long a writer waits for the database lock
    pub busy_timeout: Duration,

    /// Deadline of one service operation; expiry rolls the operation back
    pub operation_timeout: Duration,

    /// Default tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl LedgerConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Self::default()
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn with_operation_timeout(mut self, operation_timeout: Duration) -> Self {
        self.operation_timeout = operation_timeout;
        self
    }

    pub fn with_log_filter(mut self, log_filter: impl Into<String>) -> Self {
        self.log_filter = log_filter.into();
        self
    }

    /// Defaults overridden by `LEDGER_*` environment variables
    pub fn from_env() -> LedgerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> LedgerResult<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_DATABASE_URL) {
            config.database_url = url;
        }
        if let Some(raw) = lookup(ENV_MAX_CONNECTIONS) {
            config.max_connections = parse(ENV_MAX_CONNECTIONS, &raw)?;
            if config.max_connections == 0 {
                return Err(LedgerError::Configuration(format!(
                    "{ENV_MAX_CONNECTIONS} must be at least 1"
                )));
            }
        }
        if let Some(raw) = lookup(ENV_BUSY_TIMEOUT_MS) {
            config.busy_timeout = Duration::from_millis(parse(ENV_BUSY_TIMEOUT_MS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_OPERATION_TIMEOUT_MS) {
            config.operation_timeout = Duration::from_millis(parse(ENV_OPERATION_TIMEOUT_MS, &raw)?);
        }
        if let Some(filter) = lookup(ENV_LOG) {
            config.log_filter = filter;
        }

        Ok(config)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://ledger.db?mode=rwc".to_string(),
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(10),
            log_filter: "info".to_string(),
        }
    }
}

fn parse<T: std::str::FromStr>(key: &str, raw: &str) -> LedgerResult<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| LedgerError::Configuration(format!("{key}={raw:?}: {e}")))
}
