//! Decoding of solver output into a portfolio selection.

use std::fmt;

use crate::error::{QuboError, Result};
use crate::problem::AssetUniverse;
use crate::qubo::QuboMatrix;
use crate::solver::SolveSummary;

/// Default distance from 0 or 1 tolerated in solver output.
pub const DEFAULT_BINARY_TOL: f64 = 1e-5;

/// The decoded selection.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioResult {
    /// Selected asset identifiers, in universe order.
    pub selected: Vec<String>,
    /// Normalized 0/1 vector in universe order.
    pub bits: Vec<u8>,
    /// x'Qx recomputed from `bits` and the unmodified Q.
    pub objective: f64,
    /// Objective reported by the solver, when known.
    pub solver_objective: Option<f64>,
    /// Backend status and effort, when the result came through a pipeline.
    pub summary: Option<SolveSummary>,
}

impl PortfolioResult {
    /// The bitstring, e.g. `"0110"`.
    pub fn bitstring(&self) -> String {
        self.bits.iter().map(|b| if *b == 1 { '1' } else { '0' }).collect()
    }

    /// Number of selected assets.
    pub fn cardinality(&self) -> usize {
        self.selected.len()
    }

    /// Absolute difference between reported and recomputed objectives.
    pub fn objective_gap(&self) -> Option<f64> {
        self.solver_objective.map(|s| (s - self.objective).abs())
    }
}

impl fmt::Display for PortfolioResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] objective={:.6}",
            self.bitstring(),
            self.selected.join(", "),
            self.objective
        )
    }
}

/// Maps solver vectors back to asset selections.
#[derive(Debug, Clone, Copy)]
pub struct ResultDecoder {
    tol: f64,
}

impl Default for ResultDecoder {
    fn default() -> Self {
        ResultDecoder {
            tol: DEFAULT_BINARY_TOL,
        }
    }
}

impl ResultDecoder {
    /// Create a decoder accepting values within `tol` of 0 or 1.
    ///
    /// # Errors
    ///
    /// Returns a configuration error unless `0 <= tol < 0.5`. At 0.5 or more
    /// a value halfway between 0 and 1 would be accepted.
    pub fn with_tolerance(tol: f64) -> Result<Self> {
        if !(tol.is_finite() && (0.0..0.5).contains(&tol)) {
            return Err(QuboError::Configuration(format!(
                "Binary tolerance must lie in [0, 0.5), got {}",
                tol
            )));
        }
        Ok(ResultDecoder { tol })
    }

    pub fn tolerance(&self) -> f64 {
        self.tol
    }

    /// Normalize each entry of `x` to 0 or 1.
    ///
    /// # Errors
    ///
    /// Returns a decoding error naming the first entry that is non-finite or
    /// not within tolerance of 0 or 1.
    pub fn normalize(&self, x: &[f64]) -> Result<Vec<u8>> {
        x.iter()
            .enumerate()
            .map(|(i, &v)| {
                if !v.is_finite() {
                    return Err(QuboError::Decoding(format!(
                        "Entry {} is not finite ({})",
                        i, v
                    )));
                }
                let r = v.round();
                if (r == 0.0 || r == 1.0) && (v - r).abs() <= self.tol {
                    Ok(r as u8)
                } else {
                    Err(QuboError::Decoding(format!(
                        "Entry {} = {} is not within {} of 0 or 1",
                        i, v, self.tol
                    )))
                }
            })
            .collect()
    }

    /// Decode `x` against the universe and recompute x'Qx.
    ///
    /// # Errors
    ///
    /// Returns a decoding error if `x` or `q` is not aligned to the universe
    /// or if an entry of `x` is not binary within tolerance.
    pub fn decode(&self, assets: &AssetUniverse, x: &[f64], q: &QuboMatrix) -> Result<PortfolioResult> {
        let n = assets.len();
        if x.len() != n {
            return Err(QuboError::Decoding(format!(
                "Solution has {} entries, universe has {} assets",
                x.len(),
                n
            )));
        }
        if q.n() != n {
            return Err(QuboError::Decoding(format!(
                "QUBO matrix is {}x{}, universe has {} assets",
                q.n(),
                q.n(),
                n
            )));
        }

        let bits = self.normalize(x)?;
        let selected = assets
            .iter()
            .zip(&bits)
            .filter(|(_, b)| **b == 1)
            .map(|(s, _)| s.to_string())
            .collect();
        let objective = q.energy_of_bits(&bits);

        Ok(PortfolioResult {
            selected,
            bits,
            objective,
            solver_objective: None,
            summary: None,
        })
    }

    /// Like [`ResultDecoder::decode`], also recording the solver's objective.
    pub fn decode_with_reported(
        &self,
        assets: &AssetUniverse,
        x: &[f64],
        q: &QuboMatrix,
        solver_objective: f64,
    ) -> Result<PortfolioResult> {
        let mut result = self.decode(assets, x, q)?;
        result.solver_objective = Some(solver_objective);
        Ok(result)
    }
}
