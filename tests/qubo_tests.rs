//! Properties of the QUBO encoding and of decoding.

use nalgebra::{DMatrix, DVector};
use qubo_portfolio::prelude::*;

/// Tolerance for comparing floating point results
const TOL: f64 = 1e-9;

fn four_assets(lambda: f64, k: usize, p: f64) -> ProblemParameters {
    #[rustfmt::skip]
    let sigma = DMatrix::from_row_slice(4, 4, &[
        0.090, 0.045, 0.012, 0.004,
        0.045, 0.360, 0.020, 0.001,
        0.012, 0.020, 0.060, 0.008,
        0.004, 0.001, 0.008, 0.025,
    ]);
    ProblemParameters::builder(
        AssetUniverse::new(["AAPL", "TSLA", "JPM", "JNJ"]).unwrap(),
        DVector::from_vec(vec![0.21, 0.35, 0.12, 0.03]),
        sigma,
    )
    .risk_aversion(lambda)
    .cardinality(k)
    .penalty(p)
    .build()
    .unwrap()
}

/// Every binary vector of length n.
fn all_vectors(n: usize) -> impl Iterator<Item = Vec<f64>> {
    (0..(1u32 << n)).map(move |m| (0..n).map(|i| ((m >> i) & 1) as f64).collect())
}

/// x'Qx computed directly from the dense matrix.
fn quadratic_form(q: &DMatrix<f64>, x: &[f64]) -> f64 {
    let v = DVector::from_column_slice(x);
    (v.transpose() * q * &v)[(0, 0)]
}

// ============================================================================
// Encoding
// ============================================================================

#[test]
fn test_two_asset_reference_values() {
    let params = ProblemParameters::builder(
        AssetUniverse::new(["A", "B"]).unwrap(),
        DVector::from_vec(vec![0.1, 0.2]),
        DMatrix::from_row_slice(2, 2, &[0.04, 0.01, 0.01, 0.09]),
    )
    .risk_aversion(0.5)
    .cardinality(1)
    .penalty(5.0)
    .build()
    .unwrap();

    let q = build_qubo(&params).unwrap();
    assert!((q.get(0, 0) + 5.08).abs() < TOL, "Q[0,0] = {}", q.get(0, 0));
    assert!((q.get(1, 1) + 5.155).abs() < TOL, "Q[1,1] = {}", q.get(1, 1));
    assert!((q.get(0, 1) - 10.005).abs() < TOL, "Q[0,1] = {}", q.get(0, 1));
    assert!((q.get(1, 0) - 10.005).abs() < TOL, "Q[1,0] = {}", q.get(1, 0));
}

#[test]
fn test_symmetry() {
    for (lambda, k, p) in [(0.5, 2, 5.0), (0.0, 1, 0.0), (3.0, 4, 0.1), (1.0, 3, 100.0)] {
        let q = build_qubo(&four_assets(lambda, k, p)).unwrap();
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(q.get(i, j), q.get(j, i), "({}, {}) for λ={}, k={}", i, j, lambda, k);
            }
        }
    }
}

#[test]
fn test_determinism() {
    let params = four_assets(0.5, 2, 5.0);
    let a = build_qubo(&params).unwrap();
    let b = build_qubo(&params).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_energy_plus_offset_is_penalized_objective() {
    let params = four_assets(0.7, 2, 3.0);
    let q = build_qubo(&params).unwrap();
    for x in all_vectors(4) {
        let lhs = q.energy(&x) + penalty_offset(&params);
        let rhs = penalized_objective(&params, &x);
        assert!((lhs - rhs).abs() < 1e-9, "{:?}: {} vs {}", x, lhs, rhs);
    }
}

#[test]
fn test_large_penalty_prefers_k_assets() {
    let params = four_assets(0.5, 2, 5.0);
    let q = build_qubo(&params).unwrap();
    let best = all_vectors(4)
        .min_by(|a, b| q.energy(a).total_cmp(&q.energy(b)))
        .unwrap();
    assert_eq!(best.iter().sum::<f64>(), 2.0);
}

#[test]
fn test_invalid_parameters_fail_before_building() {
    let err = ProblemParameters::builder(
        AssetUniverse::new(["A", "B"]).unwrap(),
        DVector::from_vec(vec![0.1]),
        DMatrix::identity(2, 2),
    )
    .cardinality(1)
    .build()
    .unwrap_err();
    assert!(err.is_configuration());
}

// ============================================================================
// Decoding
// ============================================================================

#[test]
fn test_recomputed_objective_matches_independent_form() {
    let params = four_assets(0.5, 2, 5.0);
    let q = build_qubo(&params).unwrap();
    let decoder = ResultDecoder::default();
    for x in all_vectors(4) {
        let result = decoder.decode(params.assets(), &x, &q).unwrap();
        let expected = quadratic_form(q.as_matrix(), &x);
        assert!(
            (result.objective - expected).abs() < TOL,
            "{:?}: {} vs {}",
            x,
            result.objective,
            expected
        );
    }
}

#[test]
fn test_tolerance_rounding() {
    let universe = AssetUniverse::new(["A", "B"]).unwrap();
    let q = QuboMatrix::from_upper(DMatrix::from_row_slice(2, 2, &[-5.08, 10.005, 0.0, -5.155]));
    let decoder = ResultDecoder::default();

    let ok = decoder.decode(&universe, &[0.999999, 0.0000001], &q).unwrap();
    assert_eq!(ok.bits, vec![1, 0]);

    let err = decoder.decode(&universe, &[0.5, 0.5], &q).unwrap_err();
    assert!(matches!(err, QuboError::Decoding(_)));
}

#[test]
fn test_zero_penalty_keeps_solver_cardinality() {
    // With P = 0 and a return-only objective every asset has negative
    // diagonal and zero coupling, so the unconstrained minimum selects all
    // four even though k = 1.
    let params = four_assets(0.0, 1, 0.0);
    let result = Pipeline::new(ExhaustiveSolver::default(), ConstraintMode::Penalty)
        .run(&params)
        .unwrap();
    assert_eq!(result.cardinality(), 4);
    assert_eq!(result.bitstring(), "1111");
}

#[test]
fn test_full_cardinality_selects_everything() {
    let params = four_assets(2.0, 4, 0.0);
    let adapter = SolverAdapter::new(ExhaustiveSolver::default(), ConstraintMode::Constrained);
    let q = build_qubo(&params).unwrap();

    let request = adapter.request(&q, 4);
    assert_eq!(request.equalities, vec![LinearEquality::cardinality(4, 4)]);

    let result = Pipeline::from_adapter(adapter).run(&params).unwrap();
    assert_eq!(result.selected, params.assets().symbols().to_vec());
}
