//! TOML configuration for a selection run.
//!
//! ```toml
//! assets = ["AAPL", "TSLA", "JPM", "JNJ"]
//! risk_aversion = 0.5
//! cardinality = 2
//! penalty = 5.0
//! mode = "constrained"
//!
//! [solver]
//! backend = "branch_and_bound"
//! time_limit_secs = 30.0
//!
//! [prices]
//! periods_per_year = 252
//! AAPL = [182.0, 179.7, 179.9]
//! # ...
//! ```
//!
//! Exactly one of `[statistics]` (precomputed `mu` and `sigma`) or
//! `[prices]` (raw close prices per asset) must be present.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use nalgebra::{DMatrix, DVector};
use serde::Deserialize;

use crate::data::{AssetStatistics, StaticPriceProvider, TRADING_DAYS_PER_YEAR};
use crate::error::{QuboError, Result};
use crate::problem::{AssetUniverse, ConstraintMode, ProblemParameters};
use crate::solver::{
    AnnealSettings, AnnealingSolver, BinaryQuadraticSolver, BranchAndBoundSolver,
    BranchBoundSettings, ExhaustiveSolver,
};

fn default_risk_aversion() -> f64 {
    0.5
}

fn default_penalty() -> f64 {
    5.0
}

fn default_periods_per_year() -> f64 {
    TRADING_DAYS_PER_YEAR
}

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioConfig {
    /// Asset identifiers, in decision-variable order.
    pub assets: Vec<String>,
    #[serde(default = "default_risk_aversion")]
    pub risk_aversion: f64,
    pub cardinality: usize,
    #[serde(default = "default_penalty")]
    pub penalty: f64,
    #[serde(default)]
    pub mode: ConstraintMode,
    #[serde(default)]
    pub solver: SolverConfig,
    pub statistics: Option<StatisticsConfig>,
    pub prices: Option<PricesConfig>,
}

/// Precomputed annualized statistics.
#[derive(Debug, Clone, Deserialize)]
pub struct StatisticsConfig {
    pub mu: Vec<f64>,
    /// Row-major covariance matrix.
    pub sigma: Vec<Vec<f64>>,
}

/// Raw close prices keyed by asset identifier.
#[derive(Debug, Clone, Deserialize)]
pub struct PricesConfig {
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: f64,
    #[serde(flatten)]
    pub series: HashMap<String, Vec<f64>>,
}

/// Solver backend choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Exhaustive,
    #[default]
    BranchAndBound,
    Annealing,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Exhaustive => write!(f, "exhaustive"),
            Backend::BranchAndBound => write!(f, "branch_and_bound"),
            Backend::Annealing => write!(f, "annealing"),
        }
    }
}

impl FromStr for Backend {
    type Err = QuboError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "exhaustive" => Ok(Backend::Exhaustive),
            "branch_and_bound" | "bnb" => Ok(Backend::BranchAndBound),
            "annealing" => Ok(Backend::Annealing),
            other => Err(QuboError::Configuration(format!(
                "Unknown solver backend '{}'",
                other
            ))),
        }
    }
}

/// Solver section. Unset limits fall back to the backend defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SolverConfig {
    #[serde(default)]
    pub backend: Backend,
    pub time_limit_secs: Option<f64>,
    pub max_nodes: Option<u64>,
    pub max_variables: Option<usize>,
    pub seed: Option<u64>,
    pub sweeps: Option<usize>,
    pub restarts: Option<usize>,
}

impl SolverConfig {
    /// Instantiate the configured backend.
    pub fn build_solver(&self) -> Result<Box<dyn BinaryQuadraticSolver>> {
        if let Some(t) = self.time_limit_secs {
            if t.is_nan() || t <= 0.0 {
                return Err(QuboError::Configuration(format!(
                    "time_limit_secs must be positive, got {}",
                    t
                )));
            }
        }

        let solver: Box<dyn BinaryQuadraticSolver> = match self.backend {
            Backend::Exhaustive => Box::new(
                self.max_variables
                    .map(ExhaustiveSolver::new)
                    .unwrap_or_default(),
            ),
            Backend::BranchAndBound => {
                let mut settings = BranchBoundSettings::default();
                if let Some(t) = self.time_limit_secs {
                    settings.time_limit = t;
                }
                if let Some(n) = self.max_nodes {
                    settings.max_nodes = n;
                }
                Box::new(BranchAndBoundSolver::new(settings))
            }
            Backend::Annealing => {
                let mut settings = AnnealSettings::default();
                if let Some(t) = self.time_limit_secs {
                    settings.time_limit = t;
                }
                if let Some(seed) = self.seed {
                    settings.seed = seed;
                }
                if let Some(sweeps) = self.sweeps {
                    if sweeps == 0 {
                        return Err(QuboError::Configuration(
                            "sweeps must be at least 1".into(),
                        ));
                    }
                    settings.sweeps = sweeps;
                }
                if let Some(restarts) = self.restarts {
                    settings.restarts = restarts;
                }
                Box::new(AnnealingSolver::new(settings))
            }
        };
        Ok(solver)
    }
}

impl PortfolioConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s)
            .map_err(|e| QuboError::Configuration(format!("Invalid configuration: {}", e)))
    }

    /// Read and parse a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn universe(&self) -> Result<AssetUniverse> {
        AssetUniverse::new(self.assets.iter().cloned())
    }

    /// Annualized statistics, taken as given or estimated from prices.
    pub fn statistics(&self, universe: &AssetUniverse) -> Result<AssetStatistics> {
        match (&self.statistics, &self.prices) {
            (Some(stats), None) => stats.to_statistics(),
            (None, Some(prices)) => {
                let provider = StaticPriceProvider::from(prices.series.clone());
                AssetStatistics::from_provider(&provider, universe, prices.periods_per_year)
            }
            (Some(_), Some(_)) => Err(QuboError::Configuration(
                "Specify either [statistics] or [prices], not both".into(),
            )),
            (None, None) => Err(QuboError::Configuration(
                "Missing [statistics] or [prices] section".into(),
            )),
        }
    }

    /// Build validated problem parameters.
    pub fn parameters(&self) -> Result<ProblemParameters> {
        let universe = self.universe()?;
        let stats = self.statistics(&universe)?;
        ProblemParameters::builder(universe, stats.mu, stats.sigma)
            .risk_aversion(self.risk_aversion)
            .cardinality(self.cardinality)
            .penalty(self.penalty)
            .build()
    }
}

impl StatisticsConfig {
    fn to_statistics(&self) -> Result<AssetStatistics> {
        let n = self.sigma.len();
        if let Some(i) = self.sigma.iter().position(|row| row.len() != n) {
            return Err(QuboError::Configuration(format!(
                "Covariance row {} has {} entries, expected {}",
                i,
                self.sigma[i].len(),
                n
            )));
        }
        Ok(AssetStatistics {
            mu: DVector::from_vec(self.mu.clone()),
            sigma: DMatrix::from_fn(n, n, |i, j| self.sigma[i][j]),
        })
    }
}
