// Copyright (c) 2025 - Cowboy AI, Inc.
//! Latest market prices
//!
//! Prices come from the market-data pipeline, which lives outside the
//! ledger. The ledger only needs the latest close per symbol to value open
//! orders.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::errors::LedgerResult;

#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Latest known price of each symbol; unknown symbols are absent
    async fn latest_prices(&self, stock_ids: &[String]) -> LedgerResult<HashMap<String, Decimal>>;
}

/// In-memory price table
#[derive(Debug, Clone, Default)]
pub struct StaticPriceSource {
    prices: HashMap<String, Decimal>,
}

impl StaticPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, stock_id: impl Into<String>, price: Decimal) -> Self {
        self.prices.insert(stock_id.into(), price);
        self
    }
}

#[async_trait]
impl PriceSource for StaticPriceSource {
    async fn latest_prices(&self, stock_ids: &[String]) -> LedgerResult<HashMap<String, Decimal>> {
        Ok(stock_ids
            .iter()
            .filter_map(|id| self.prices.get(id).map(|price| (id.clone(), *price)))
            .collect())
    }
}
