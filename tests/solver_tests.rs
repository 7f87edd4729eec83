//! Backend agreement tests.
//!
//! Each test case builds a problem and a mode; every exact backend must match
//! exhaustive enumeration, and the annealer must find the same optimum on
//! these small instances.

use nalgebra::{DMatrix, DVector};
use qubo_portfolio::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Tolerance for comparing floating point results
const TOL: f64 = 1e-6;

/// A test case definition
struct TestCase {
    name: &'static str,
    mode: ConstraintMode,
    /// Function that builds the problem parameters
    build: fn() -> ProblemParameters,
}

/// Random covariance `A A' / n + diag`, returns in [-0.1, 0.4].
fn random_problem(seed: u64, n: usize, lambda: f64, k: usize, p: f64) -> ProblemParameters {
    let mut rng = StdRng::seed_from_u64(seed);
    let a = DMatrix::from_fn(n, n, |_, _| rng.random_range(-0.3..0.3));
    let mut sigma = &a * a.transpose() / n as f64;
    for i in 0..n {
        sigma[(i, i)] += 0.01;
    }
    let sigma = (&sigma + sigma.transpose()) * 0.5;
    let mu = DVector::from_fn(n, |_, _| rng.random_range(-0.1..0.4));
    let assets = AssetUniverse::new((0..n).map(|i| format!("S{:02}", i))).unwrap();

    ProblemParameters::builder(assets, mu, sigma)
        .risk_aversion(lambda)
        .cardinality(k)
        .penalty(p)
        .build()
        .unwrap()
}

fn test_cases() -> Vec<TestCase> {
    vec![
        TestCase {
            name: "reference_four_assets_constrained",
            mode: ConstraintMode::Constrained,
            build: || {
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
                .risk_aversion(0.5)
                .cardinality(2)
                .penalty(5.0)
                .build()
                .unwrap()
            },
        },
        TestCase {
            name: "random_8_penalty_only",
            mode: ConstraintMode::Penalty,
            build: || random_problem(1, 8, 0.5, 3, 2.0),
        },
        TestCase {
            name: "random_8_constrained_no_penalty",
            mode: ConstraintMode::Constrained,
            build: || random_problem(2, 8, 1.0, 4, 0.0),
        },
        TestCase {
            name: "random_10_constrained_with_penalty",
            mode: ConstraintMode::Constrained,
            build: || random_problem(3, 10, 2.0, 3, 1.0),
        },
        TestCase {
            name: "random_6_return_only",
            mode: ConstraintMode::Constrained,
            build: || random_problem(4, 6, 0.0, 2, 0.0),
        },
        TestCase {
            name: "single_asset",
            mode: ConstraintMode::Penalty,
            build: || random_problem(5, 1, 0.5, 1, 5.0),
        },
    ]
}

fn run(case: &TestCase, solver: impl BinaryQuadraticSolver + 'static) -> PortfolioResult {
    let params = (case.build)();
    Pipeline::new(solver, case.mode)
        .run(&params)
        .unwrap_or_else(|e| panic!("{}: {}", case.name, e))
}

#[test]
fn test_branch_and_bound_matches_exhaustive() {
    for case in test_cases() {
        let exact = run(&case, ExhaustiveSolver::default());
        let bnb = run(&case, BranchAndBoundSolver::default());
        assert!(
            (exact.objective - bnb.objective).abs() < TOL,
            "{}: exhaustive {} ({}) vs branch and bound {} ({})",
            case.name,
            exact.objective,
            exact.bitstring(),
            bnb.objective,
            bnb.bitstring()
        );
    }
}

#[test]
fn test_annealing_matches_exhaustive() {
    for case in test_cases() {
        let exact = run(&case, ExhaustiveSolver::default());
        let heur = run(
            &case,
            AnnealingSolver::new(AnnealSettings {
                seed: 42,
                ..Default::default()
            }),
        );
        assert!(
            (exact.objective - heur.objective).abs() < TOL,
            "{}: exhaustive {} vs annealing {}",
            case.name,
            exact.objective,
            heur.objective
        );
    }
}

#[test]
fn test_constrained_mode_always_hits_cardinality() {
    for case in test_cases()
        .into_iter()
        .filter(|c| c.mode == ConstraintMode::Constrained)
    {
        let k = (case.build)().cardinality();
        for result in [
            run(&case, ExhaustiveSolver::default()),
            run(&case, BranchAndBoundSolver::default()),
            run(&case, AnnealingSolver::default()),
        ] {
            assert_eq!(result.cardinality(), k, "{}", case.name);
        }
    }
}

#[test]
fn test_reported_objective_matches_recomputed() {
    for case in test_cases() {
        let result = run(&case, BranchAndBoundSolver::default());
        let gap = result.objective_gap().unwrap();
        assert!(gap < TOL, "{}: gap {}", case.name, gap);
    }
}

#[test]
fn test_solver_error_propagates() {
    let params = random_problem(6, 6, 0.5, 2, 1.0);
    let solver = BranchAndBoundSolver::new(BranchBoundSettings {
        max_nodes: 0,
        ..Default::default()
    });
    let err = Pipeline::new(solver, ConstraintMode::Constrained)
        .run(&params)
        .unwrap_err();
    assert!(err.is_solver(), "{}", err);
    assert!(err.to_string().contains("branch_and_bound"));
}

#[test]
fn test_time_limit_is_solver_error() {
    let params = random_problem(8, 8, 0.5, 3, 1.0);
    let backends: [(&str, fn() -> Box<dyn BinaryQuadraticSolver>); 2] = [
        ("branch_and_bound", || -> Box<dyn BinaryQuadraticSolver> {
            Box::new(BranchAndBoundSolver::new(BranchBoundSettings {
                time_limit: 0.0,
                ..Default::default()
            }))
        }),
        ("annealing", || -> Box<dyn BinaryQuadraticSolver> {
            Box::new(AnnealingSolver::new(AnnealSettings {
                time_limit: 0.0,
                ..Default::default()
            }))
        }),
    ];

    for (name, make) in backends {
        for mode in [ConstraintMode::Constrained, ConstraintMode::Penalty] {
            let err = Pipeline::from_adapter(SolverAdapter::from_boxed(make(), mode))
                .run(&params)
                .unwrap_err();
            assert!(err.is_solver(), "{} ({}): {}", name, mode, err);
            let msg = err.to_string();
            assert!(msg.contains(name), "{}", msg);
            assert!(msg.contains("time limit"), "{}", msg);
        }
    }
}

#[test]
fn test_exhaustive_size_limit_propagates() {
    let params = random_problem(7, 6, 0.5, 2, 1.0);
    let err = Pipeline::new(ExhaustiveSolver::new(5), ConstraintMode::Penalty)
        .run(&params)
        .unwrap_err();
    assert!(err.is_solver());
}

#[test]
fn test_pipeline_from_config() {
    let toml_str = r#"
assets = ["AAPL", "TSLA", "JPM", "JNJ"]
risk_aversion = 0.5
cardinality = 2
penalty = 5.0

[solver]
backend = "exhaustive"

[prices]
AAPL = [177.6, 182.0, 179.7, 174.9, 172.0, 172.2, 175.1, 170.0, 169.8, 172.6]
TSLA = [399.9, 382.0, 364.0, 355.0, 342.3, 352.3, 342.0, 332.7, 317.5, 309.0]
JPM  = [160.0, 161.8, 164.9, 163.5, 165.0, 163.8, 162.5, 164.3, 166.0, 167.4]
JNJ  = [168.9, 170.8, 171.4, 171.5, 171.5, 172.6, 173.0, 174.7, 172.6, 174.5]
"#;
    let config = PortfolioConfig::from_toml_str(toml_str).unwrap();
    let params = config.parameters().unwrap();
    let result = Pipeline::from_config(&config).unwrap().run(&params).unwrap();
    assert_eq!(result.cardinality(), 2);
    assert_eq!(result.bits.len(), 4);
}
