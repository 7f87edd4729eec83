//! Reference collaborators that supply μ and Σ.

mod market;
mod stats;

pub use market::{MarketDataProvider, StaticPriceProvider};
pub use stats::{estimate_statistics, AssetStatistics, TRADING_DAYS_PER_YEAR};
