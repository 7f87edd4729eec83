//! Annualized return statistics from price series.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use super::market::MarketDataProvider;
use crate::error::{QuboError, Result};
use crate::problem::AssetUniverse;

/// Trading days per year.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Annualized expected returns and covariance, index-aligned to a universe.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetStatistics {
    pub mu: DVector<f64>,
    pub sigma: DMatrix<f64>,
}

impl AssetStatistics {
    /// Fetch every asset's series from `provider` and estimate statistics.
    ///
    /// # Errors
    ///
    /// Returns a market data error if a series is missing and an estimation
    /// error if the series lengths differ or fail [`estimate_statistics`].
    pub fn from_provider(
        provider: &dyn MarketDataProvider,
        universe: &AssetUniverse,
        periods_per_year: f64,
    ) -> Result<Self> {
        let series = universe
            .iter()
            .map(|s| provider.close_prices(s))
            .collect::<Result<Vec<_>>>()?;

        let rows = series[0].len();
        if let Some((i, s)) = series.iter().enumerate().find(|(_, s)| s.len() != rows) {
            return Err(QuboError::Estimation(format!(
                "Price series for '{}' has {} observations, '{}' has {}",
                universe.symbols()[i],
                s.len(),
                universe.symbols()[0],
                rows
            )));
        }

        let prices = DMatrix::from_fn(rows, series.len(), |t, j| series[j][t]);
        estimate_statistics(&prices, periods_per_year)
    }
}

/// Estimate annualized statistics from close prices.
///
/// Rows of `prices` are observations (oldest first), columns are assets.
/// With log-returns `r_t = ln(p_t / p_{t-1})`:
///
/// - `mu = periods_per_year * mean(r)`
/// - `sigma = periods_per_year * cov(r)`, sample covariance with `T - 1`
///
/// # Errors
///
/// Returns an estimation error with fewer than three observations, a
/// non-positive or non-finite price, or a non-positive `periods_per_year`.
pub fn estimate_statistics(prices: &DMatrix<f64>, periods_per_year: f64) -> Result<AssetStatistics> {
    let (rows, cols) = prices.shape();
    if rows < 3 {
        return Err(QuboError::Estimation(format!(
            "Need at least 3 price observations, got {}",
            rows
        )));
    }
    if cols == 0 {
        return Err(QuboError::Estimation("No assets in price matrix".into()));
    }
    if !(periods_per_year.is_finite() && periods_per_year > 0.0) {
        return Err(QuboError::Estimation(format!(
            "Periods per year must be positive, got {}",
            periods_per_year
        )));
    }
    if let Some(p) = prices.iter().find(|p| !(p.is_finite() && **p > 0.0)) {
        return Err(QuboError::Estimation(format!(
            "Prices must be positive and finite, found {}",
            p
        )));
    }

    let t = rows - 1;
    let returns = DMatrix::from_fn(t, cols, |r, c| (prices[(r + 1, c)] / prices[(r, c)]).ln());

    let mean = DVector::from_fn(cols, |c, _| returns.column(c).sum() / t as f64);
    let mut centered = returns;
    for c in 0..cols {
        let m = mean[c];
        centered.column_mut(c).add_scalar_mut(-m);
    }
    let cov = (centered.transpose() * &centered) / (t - 1) as f64;
    let cov = (&cov + cov.transpose()) * 0.5;

    debug!(observations = rows, assets = cols, "estimated return statistics");

    Ok(AssetStatistics {
        mu: mean * periods_per_year,
        sigma: cov * periods_per_year,
    })
}
