//! # qubo-portfolio
//!
//! Cardinality-constrained mean-variance asset selection encoded as a
//! Quadratic Unconstrained Binary Optimization (QUBO) problem.
//!
//! Given annualized expected returns μ, a covariance matrix Σ, a risk
//! aversion λ, a target number of assets k and a penalty weight P, the crate
//! builds a symmetric matrix Q such that minimizing x'Qx over x in {0,1}^n
//! trades return against risk while favouring exactly k selected assets. The
//! minimizing bitstring is obtained from a pluggable binary quadratic solver
//! and decoded back into an asset list.
//!
//! ## Quick Start
//!
//! ```ignore
//! use qubo_portfolio::prelude::*;
//!
//! let params = ProblemParameters::builder(assets, mu, sigma)
//!     .risk_aversion(0.5)
//!     .cardinality(2)
//!     .penalty(5.0)
//!     .build()?;
//!
//! let result = Pipeline::new(BranchAndBoundSolver::default(), ConstraintMode::Constrained)
//!     .run(&params)?;
//!
//! println!("{} {:?}", result.bitstring(), result.selected);
//! ```
//!
//! ## Encoding
//!
//! ```text
//! Q[i,i] = -μ_i + λ Σ[i,i] + P (1 - 2k)
//! Q[i,j] =  λ Σ[i,j] + 2P                 (i != j)
//! ```
//!
//! ## Solvers
//!
//! - [`ExhaustiveSolver`](solver::ExhaustiveSolver): exact enumeration for small n
//! - [`BranchAndBoundSolver`](solver::BranchAndBoundSolver): exact, bounded by
//!   convex QP relaxations solved with Clarabel
//! - [`AnnealingSolver`](solver::AnnealingSolver): simulated annealing heuristic
//!
//! ## Architecture
//!
//! - **Problem** parameters are validated once and borrowed by every stage
//! - **QUBO** construction is a pure function of the parameters
//! - **Solver** backends sit behind the [`BinaryQuadraticSolver`](solver::BinaryQuadraticSolver) trait
//! - **Decoding** recomputes the objective independently of the solver

pub mod config;
pub mod data;
pub mod decode;
pub mod error;
pub mod pipeline;
pub mod problem;
pub mod qubo;
pub mod solver;
pub mod sparse;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use qubo_portfolio::prelude::*;
/// ```
pub mod prelude {
    // Problem inputs
    pub use crate::problem::{AssetUniverse, ConstraintMode, ProblemParameters};

    // Encoding
    pub use crate::qubo::{build_qubo, penalized_objective, penalty_offset, QuboMatrix};

    // Solvers
    pub use crate::solver::{
        AnnealSettings, AnnealingSolver, BinaryQuadraticSolver, BranchAndBoundSolver,
        BranchBoundSettings, Candidate, ExhaustiveSolver, LinearEquality, SolveRequest,
        SolveStatus, SolveSummary, SolverAdapter, SolverOutput,
    };

    // Decoding
    pub use crate::decode::{PortfolioResult, ResultDecoder};

    // Pipeline and collaborators
    pub use crate::config::{Backend, PortfolioConfig};
    pub use crate::data::{estimate_statistics, AssetStatistics, MarketDataProvider, StaticPriceProvider};
    pub use crate::pipeline::Pipeline;

    // Errors
    pub use crate::error::{QuboError, Result};
}

// Re-export main types at crate root
pub use error::{QuboError, Result};
pub use pipeline::Pipeline;
pub use problem::ProblemParameters;
