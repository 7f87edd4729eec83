//! Binary quadratic solver interface and backends.
//!
//! This module provides:
//! - The [`BinaryQuadraticSolver`] capability and its request/response types
//! - An exhaustive enumerator and a Clarabel-backed branch and bound (exact)
//! - A simulated annealer (heuristic)
//! - [`SolverAdapter`], which turns a QUBO matrix and a cardinality target into
//!   a request according to the configured [`ConstraintMode`](crate::problem::ConstraintMode)

pub mod adapter;
pub mod anneal;
pub mod branch_bound;
pub mod exhaustive;
mod relaxation;
pub mod request;

pub use adapter::{Candidate, SolverAdapter};
pub use anneal::{AnnealSettings, AnnealingSolver};
pub use branch_bound::{BranchAndBoundSolver, BranchBoundSettings};
pub use exhaustive::ExhaustiveSolver;
pub use request::{LinearEquality, SolveRequest};

use crate::error::Result;

/// Outcome status reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Proven optimal solution found.
    Optimal,
    /// Feasible solution found without an optimality proof (heuristics).
    Feasible,
    /// No vector satisfies the constraints.
    Infeasible,
    /// Node or iteration limit reached before the search finished.
    IterationLimit,
    /// Time limit reached before the search finished.
    TimeLimit,
    /// Numerical difficulties in a subproblem.
    NumericalError,
}

impl SolveStatus {
    /// Whether the output carries a usable solution.
    pub fn has_solution(&self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

/// Raw output from a backend.
#[derive(Debug, Clone)]
pub struct SolverOutput {
    /// Solution status.
    pub status: SolveStatus,
    /// Solution vector, values interpretable as 0/1 (if solved).
    pub x: Option<Vec<f64>>,
    /// Objective value x'Qx as reported by the backend (if solved).
    pub objective: Option<f64>,
    /// Backend-specific work counter (nodes, sweeps, vectors visited).
    pub iterations: u64,
    /// Solve time in seconds.
    pub solve_time: f64,
}

impl SolverOutput {
    /// An output carrying a solution.
    pub fn solved(status: SolveStatus, x: Vec<f64>, objective: f64) -> Self {
        SolverOutput {
            status,
            x: Some(x),
            objective: Some(objective),
            iterations: 0,
            solve_time: 0.0,
        }
    }

    /// An output without a solution.
    pub fn failed(status: SolveStatus) -> Self {
        SolverOutput {
            status,
            x: None,
            objective: None,
            iterations: 0,
            solve_time: 0.0,
        }
    }

    pub(crate) fn with_stats(mut self, iterations: u64, solve_time: f64) -> Self {
        self.iterations = iterations;
        self.solve_time = solve_time;
        self
    }
}

/// How a successful solve went: which backend, its status and effort.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveSummary {
    pub backend: &'static str,
    /// `Optimal` for exact backends, `Feasible` for heuristics.
    pub status: SolveStatus,
    /// Backend-specific work counter (nodes, sweeps, vectors visited).
    pub iterations: u64,
    /// Solve time in seconds.
    pub solve_time: f64,
}

/// A backend that minimizes x'Qx over binary vectors, optionally subject to
/// linear equality constraints.
///
/// Implementations return `Err` only when they cannot attempt the request at
/// all (unsupported constraint shape, problem too large). Search outcomes such
/// as infeasibility or limits are reported through [`SolveStatus`].
pub trait BinaryQuadraticSolver: Send + Sync {
    /// Short backend name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Minimize the request's objective.
    fn solve(&self, request: &SolveRequest<'_>) -> Result<SolverOutput>;
}
