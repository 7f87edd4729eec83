//! Penalty-method encoding of cardinality-constrained mean-variance selection.
//!
//! The objective
//!
//! ```text
//! minimize  -μ'x + λ x'Σx + P (sum(x) - k)^2,   x in {0,1}^n
//! ```
//!
//! is expanded using `x_i^2 = x_i`. Dropping the constant `P k^2` gives
//!
//! ```text
//! Q[i,i] = -μ_i + λ Σ[i,i] + P (1 - 2k)
//! Q[i,j] = λ Σ[i,j] + 2P                  (i != j)
//! ```
//!
//! The cross term `2P x_i x_j` of the squared penalty is split evenly between
//! `Q[i,j]` and `Q[j,i]`, each unordered pair appearing twice in x'Qx. For
//! that to hold Q must stay symmetric, so the off-diagonal is computed once
//! from the upper triangle and mirrored.

use nalgebra::DMatrix;

use super::matrix::QuboMatrix;
use crate::error::Result;
use crate::problem::ProblemParameters;

/// Build the QUBO matrix for the given parameters.
///
/// # Errors
///
/// Returns a configuration error, before any arithmetic, if the parameters
/// fail [`ProblemParameters::validate`].
pub fn build_qubo(params: &ProblemParameters) -> Result<QuboMatrix> {
    params.validate()?;

    let n = params.n();
    let mu = params.mu();
    let sigma = params.sigma();
    let lambda = params.risk_aversion();
    let p = params.penalty();
    let k = params.cardinality() as f64;

    let mut upper = DMatrix::zeros(n, n);
    for i in 0..n {
        upper[(i, i)] = -mu[i] + lambda * sigma[(i, i)] + p * (1.0 - 2.0 * k);
        for j in (i + 1)..n {
            upper[(i, j)] = lambda * sigma[(i, j)] + 2.0 * p;
        }
    }

    Ok(QuboMatrix::from_upper(upper))
}

/// The constant `P k^2` dropped from the expanded penalty.
///
/// `energy(x) + penalty_offset(params)` equals the full objective
/// [`penalized_objective`].
pub fn penalty_offset(params: &ProblemParameters) -> f64 {
    let k = params.cardinality() as f64;
    params.penalty() * k * k
}

/// Evaluate `-μ'x + λ x'Σx + P (sum(x) - k)^2` directly, without Q.
///
/// # Panics
///
/// Panics if `x.len()` differs from the number of assets.
pub fn penalized_objective(params: &ProblemParameters, x: &[f64]) -> f64 {
    let n = params.n();
    assert_eq!(x.len(), n, "vector length must match number of assets");

    let mu = params.mu();
    let sigma = params.sigma();

    let ret: f64 = (0..n).map(|i| mu[i] * x[i]).sum();
    let mut risk = 0.0;
    for i in 0..n {
        for j in 0..n {
            risk += x[i] * sigma[(i, j)] * x[j];
        }
    }
    let violation = x.iter().sum::<f64>() - params.cardinality() as f64;

    -ret + params.risk_aversion() * risk + params.penalty() * violation * violation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::AssetUniverse;
    use nalgebra::DVector;

    const TOL: f64 = 1e-12;

    fn params(lambda: f64, k: usize, p: f64) -> ProblemParameters {
        ProblemParameters::builder(
            AssetUniverse::new(["A", "B"]).unwrap(),
            DVector::from_vec(vec![0.1, 0.2]),
            DMatrix::from_row_slice(2, 2, &[0.04, 0.01, 0.01, 0.09]),
        )
        .risk_aversion(lambda)
        .cardinality(k)
        .penalty(p)
        .build()
        .unwrap()
    }

    #[test]
    fn test_two_asset_entries() {
        let q = build_qubo(&params(0.5, 1, 5.0)).unwrap();
        assert!((q.get(0, 0) - (-5.08)).abs() < TOL);
        assert!((q.get(1, 1) - (-5.155)).abs() < TOL);
        assert!((q.get(0, 1) - 10.005).abs() < TOL);
        assert_eq!(q.get(0, 1), q.get(1, 0));
    }

    #[test]
    fn test_zero_lambda_drops_risk() {
        let q = build_qubo(&params(0.0, 1, 0.0)).unwrap();
        assert_eq!(q.get(0, 0), -0.1);
        assert_eq!(q.get(1, 1), -0.2);
        assert_eq!(q.get(0, 1), 0.0);
    }

    #[test]
    fn test_offset_recovers_full_objective() {
        let p = params(0.5, 1, 5.0);
        let q = build_qubo(&p).unwrap();
        for bits in [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]] {
            let lhs = q.energy(&bits) + penalty_offset(&p);
            let rhs = penalized_objective(&p, &bits);
            assert!((lhs - rhs).abs() < 1e-9, "{:?}: {} vs {}", bits, lhs, rhs);
        }
    }
}
