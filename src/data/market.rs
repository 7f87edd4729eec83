//! Market data provider interface.

use std::collections::HashMap;

use crate::error::{QuboError, Result};

/// Supplies a time-ordered close-price series per asset symbol.
///
/// Fetching, retries and rate limiting are the provider's concern.
pub trait MarketDataProvider {
    /// Close prices for `symbol`, oldest first.
    fn close_prices(&self, symbol: &str) -> Result<Vec<f64>>;
}

/// In-memory price series, typically loaded from a configuration file.
#[derive(Debug, Clone, Default)]
pub struct StaticPriceProvider {
    series: HashMap<String, Vec<f64>>,
}

impl StaticPriceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the series for `symbol`.
    pub fn with_series(mut self, symbol: impl Into<String>, prices: Vec<f64>) -> Self {
        self.series.insert(symbol.into(), prices);
        self
    }
}

impl From<HashMap<String, Vec<f64>>> for StaticPriceProvider {
    fn from(series: HashMap<String, Vec<f64>>) -> Self {
        StaticPriceProvider { series }
    }
}

impl MarketDataProvider for StaticPriceProvider {
    fn close_prices(&self, symbol: &str) -> Result<Vec<f64>> {
        self.series
            .get(symbol)
            .cloned()
            .ok_or_else(|| QuboError::MarketData(format!("No price series for '{}'", symbol)))
    }
}
