//! Solver request: a QUBO matrix plus optional linear equality constraints.

use crate::error::{QuboError, Result};
use crate::qubo::QuboMatrix;

/// Tolerance for checking that a 0/1 vector satisfies an equality.
pub const FEASIBILITY_TOL: f64 = 1e-6;

/// A linear equality `coeffs · x == rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearEquality {
    pub coeffs: Vec<f64>,
    pub rhs: f64,
}

impl LinearEquality {
    /// Create an equality constraint.
    pub fn new(coeffs: Vec<f64>, rhs: f64) -> Self {
        LinearEquality { coeffs, rhs }
    }

    /// The cardinality constraint `sum(x) == k` over `n` variables.
    pub fn cardinality(n: usize, k: usize) -> Self {
        LinearEquality {
            coeffs: vec![1.0; n],
            rhs: k as f64,
        }
    }

    /// If this is `sum(x) == k` for a non-negative integer k, return k.
    pub fn as_cardinality(&self) -> Option<usize> {
        let all_ones = self.coeffs.iter().all(|&c| c == 1.0);
        if all_ones && self.rhs >= 0.0 && self.rhs.fract() == 0.0 {
            Some(self.rhs as usize)
        } else {
            None
        }
    }

    /// Left-hand side `coeffs · x`.
    pub fn lhs(&self, x: &[f64]) -> f64 {
        self.coeffs.iter().zip(x).map(|(a, b)| a * b).sum()
    }

    /// Check `|coeffs · x - rhs| <= tol`.
    pub fn is_satisfied(&self, x: &[f64], tol: f64) -> bool {
        (self.lhs(x) - self.rhs).abs() <= tol
    }
}

/// A binary quadratic program handed to a solver backend:
///
/// ```text
/// minimize    x' Q x
/// subject to  a_i · x == b_i   for each equality
///             x in {0,1}^n
/// ```
#[derive(Debug, Clone)]
pub struct SolveRequest<'a> {
    pub q: &'a QuboMatrix,
    pub equalities: Vec<LinearEquality>,
}

impl<'a> SolveRequest<'a> {
    /// An unconstrained request.
    pub fn new(q: &'a QuboMatrix) -> Self {
        SolveRequest {
            q,
            equalities: Vec::new(),
        }
    }

    /// Add an equality constraint.
    pub fn with_equality(mut self, eq: LinearEquality) -> Self {
        self.equalities.push(eq);
        self
    }

    /// Number of binary variables.
    pub fn n(&self) -> usize {
        self.q.n()
    }

    /// If the only constraint is `sum(x) == k`, return k.
    pub fn single_cardinality(&self) -> Option<usize> {
        match self.equalities.as_slice() {
            [eq] => eq.as_cardinality(),
            _ => None,
        }
    }

    /// Check all equalities against `x`.
    pub fn is_feasible(&self, x: &[f64]) -> bool {
        self.equalities
            .iter()
            .all(|eq| eq.is_satisfied(x, FEASIBILITY_TOL))
    }

    /// Check that every constraint is aligned to the matrix and finite.
    pub fn validate(&self, backend: &'static str) -> Result<()> {
        let n = self.n();
        for (i, eq) in self.equalities.iter().enumerate() {
            if eq.coeffs.len() != n {
                return Err(QuboError::solver(
                    backend,
                    format!(
                        "Equality {} has {} coefficients, expected {}",
                        i,
                        eq.coeffs.len(),
                        n
                    ),
                ));
            }
            if !eq.rhs.is_finite() || eq.coeffs.iter().any(|c| !c.is_finite()) {
                return Err(QuboError::solver(
                    backend,
                    format!("Equality {} has non-finite data", i),
                ));
            }
        }
        Ok(())
    }
}
