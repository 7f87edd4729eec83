//! Problem parameters for cardinality-constrained asset selection.

use std::fmt;
use std::str::FromStr;

use nalgebra::{DMatrix, DVector};
use serde::Deserialize;

use super::universe::AssetUniverse;
use crate::error::{QuboError, Result};

/// Relative tolerance used when checking that the covariance matrix is symmetric.
const SYMMETRY_TOL: f64 = 1e-9;

/// How the "exactly k assets" requirement reaches the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintMode {
    /// Only the penalty folded into Q; the solver may return any cardinality.
    Penalty,
    /// A hard `sum(x) == k` equality is submitted alongside Q.
    #[default]
    Constrained,
}

impl ConstraintMode {
    /// Whether the solver request carries a hard cardinality constraint.
    pub fn is_constrained(&self) -> bool {
        matches!(self, ConstraintMode::Constrained)
    }
}

impl fmt::Display for ConstraintMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintMode::Penalty => write!(f, "penalty"),
            ConstraintMode::Constrained => write!(f, "constrained"),
        }
    }
}

impl FromStr for ConstraintMode {
    type Err = QuboError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "penalty" => Ok(ConstraintMode::Penalty),
            "constrained" => Ok(ConstraintMode::Constrained),
            other => Err(QuboError::Configuration(format!(
                "Unknown constraint mode '{}' (expected 'penalty' or 'constrained')",
                other
            ))),
        }
    }
}

/// Immutable inputs to the QUBO encoding.
///
/// Construct through [`ProblemParameters::builder`]; a built value has passed
/// [`ProblemParameters::validate`].
#[derive(Debug, Clone)]
pub struct ProblemParameters {
    assets: AssetUniverse,
    mu: DVector<f64>,
    sigma: DMatrix<f64>,
    risk_aversion: f64,
    cardinality: usize,
    penalty: f64,
}

impl ProblemParameters {
    /// Start building parameters for the given universe and statistics.
    ///
    /// Risk aversion defaults to 0.5 and the penalty weight to 5.0. The
    /// cardinality target has no default and must be set.
    pub fn builder(
        assets: AssetUniverse,
        mu: DVector<f64>,
        sigma: DMatrix<f64>,
    ) -> ParametersBuilder {
        ParametersBuilder {
            assets,
            mu,
            sigma,
            risk_aversion: 0.5,
            cardinality: None,
            penalty: 5.0,
        }
    }

    pub fn assets(&self) -> &AssetUniverse {
        &self.assets
    }

    /// Annualized expected returns, aligned to the universe.
    pub fn mu(&self) -> &DVector<f64> {
        &self.mu
    }

    /// Annualized covariance matrix, aligned to the universe.
    pub fn sigma(&self) -> &DMatrix<f64> {
        &self.sigma
    }

    /// Risk aversion weight λ.
    pub fn risk_aversion(&self) -> f64 {
        self.risk_aversion
    }

    /// Target number of selected assets k.
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    /// Penalty weight P for violating the cardinality target.
    pub fn penalty(&self) -> f64 {
        self.penalty
    }

    /// Number of assets (binary variables).
    pub fn n(&self) -> usize {
        self.assets.len()
    }

    /// Check every precondition of the QUBO encoding.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if:
    /// - `mu` or `sigma` is not aligned to the universe
    /// - `mu` or `sigma` contains a non-finite value
    /// - `sigma` is not symmetric
    /// - risk aversion or penalty is negative or non-finite
    /// - the cardinality is outside `[1, n]`
    pub fn validate(&self) -> Result<()> {
        let n = self.assets.len();

        if self.mu.len() != n {
            return Err(QuboError::Configuration(format!(
                "Expected return vector has length {}, universe has {} assets",
                self.mu.len(),
                n
            )));
        }
        if self.sigma.nrows() != n || self.sigma.ncols() != n {
            return Err(QuboError::Configuration(format!(
                "Covariance matrix is {}x{}, expected {}x{}",
                self.sigma.nrows(),
                self.sigma.ncols(),
                n,
                n
            )));
        }
        if let Some(i) = self.mu.iter().position(|v| !v.is_finite()) {
            return Err(QuboError::Configuration(format!(
                "Expected return for '{}' is not finite",
                self.assets.symbols()[i]
            )));
        }
        for i in 0..n {
            for j in 0..n {
                let a = self.sigma[(i, j)];
                if !a.is_finite() {
                    return Err(QuboError::Configuration(format!(
                        "Covariance entry ({}, {}) is not finite",
                        i, j
                    )));
                }
                if j > i {
                    let b = self.sigma[(j, i)];
                    let scale = 1.0_f64.max(a.abs()).max(b.abs());
                    if (a - b).abs() > SYMMETRY_TOL * scale {
                        return Err(QuboError::Configuration(format!(
                            "Covariance matrix is not symmetric at ({}, {}): {} vs {}",
                            i, j, a, b
                        )));
                    }
                }
            }
        }
        if !self.risk_aversion.is_finite() || self.risk_aversion < 0.0 {
            return Err(QuboError::Configuration(format!(
                "Risk aversion must be a non-negative number, got {}",
                self.risk_aversion
            )));
        }
        if !self.penalty.is_finite() || self.penalty < 0.0 {
            return Err(QuboError::Configuration(format!(
                "Penalty weight must be a non-negative number, got {}",
                self.penalty
            )));
        }
        if self.cardinality < 1 || self.cardinality > n {
            return Err(QuboError::Configuration(format!(
                "Cardinality target {} is outside [1, {}]",
                self.cardinality, n
            )));
        }

        Ok(())
    }
}

/// Builder for [`ProblemParameters`].
#[derive(Debug, Clone)]
pub struct ParametersBuilder {
    assets: AssetUniverse,
    mu: DVector<f64>,
    sigma: DMatrix<f64>,
    risk_aversion: f64,
    cardinality: Option<usize>,
    penalty: f64,
}

impl ParametersBuilder {
    /// Set the risk aversion weight λ.
    pub fn risk_aversion(mut self, lambda: f64) -> Self {
        self.risk_aversion = lambda;
        self
    }

    /// Set the number of assets to select.
    pub fn cardinality(mut self, k: usize) -> Self {
        self.cardinality = Some(k);
        self
    }

    /// Set the penalty weight P.
    pub fn penalty(mut self, p: f64) -> Self {
        self.penalty = p;
        self
    }

    /// Validate and build the parameters.
    pub fn build(self) -> Result<ProblemParameters> {
        let cardinality = self.cardinality.ok_or_else(|| {
            QuboError::Configuration("Cardinality target was not set".into())
        })?;

        let params = ProblemParameters {
            assets: self.assets,
            mu: self.mu,
            sigma: self.sigma,
            risk_aversion: self.risk_aversion,
            cardinality,
            penalty: self.penalty,
        };
        params.validate()?;
        Ok(params)
    }
}
