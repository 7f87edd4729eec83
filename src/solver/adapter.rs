//! Bridge between a QUBO matrix and a [`BinaryQuadraticSolver`] backend.

use tracing::{debug, info};

use super::{BinaryQuadraticSolver, LinearEquality, SolveRequest, SolveStatus, SolveSummary};
use crate::error::{QuboError, Result};
use crate::problem::ConstraintMode;
use crate::qubo::QuboMatrix;

/// A solution candidate returned by the adapter.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Solution vector as returned by the backend.
    pub x: Vec<f64>,
    /// Objective value reported by the backend.
    pub objective: f64,
    /// Backend, status and effort of the solve.
    pub summary: SolveSummary,
}

/// Sends a QUBO matrix to a backend, with or without a hard cardinality
/// constraint depending on the [`ConstraintMode`].
pub struct SolverAdapter {
    solver: Box<dyn BinaryQuadraticSolver>,
    mode: ConstraintMode,
}

impl std::fmt::Debug for SolverAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverAdapter")
            .field("solver", &self.solver.name())
            .field("mode", &self.mode)
            .finish()
    }
}

impl SolverAdapter {
    /// Create an adapter around a backend.
    pub fn new(solver: impl BinaryQuadraticSolver + 'static, mode: ConstraintMode) -> Self {
        SolverAdapter {
            solver: Box::new(solver),
            mode,
        }
    }

    /// Create an adapter around an already boxed backend.
    pub fn from_boxed(solver: Box<dyn BinaryQuadraticSolver>, mode: ConstraintMode) -> Self {
        SolverAdapter { solver, mode }
    }

    pub fn mode(&self) -> ConstraintMode {
        self.mode
    }

    /// Name of the wrapped backend.
    pub fn backend(&self) -> &'static str {
        self.solver.name()
    }

    /// The request that [`SolverAdapter::solve`] submits for `q` and `k`.
    pub fn request<'a>(&self, q: &'a QuboMatrix, k: usize) -> SolveRequest<'a> {
        let request = SolveRequest::new(q);
        if self.mode.is_constrained() {
            request.with_equality(LinearEquality::cardinality(q.n(), k))
        } else {
            request
        }
    }

    /// Solve `min x'Qx` for a selection of `k` assets.
    ///
    /// # Errors
    ///
    /// - Configuration error if `k` is outside `[1, n]`
    /// - Solver error if the backend rejects the request or finishes without
    ///   a solution (infeasible, limits, numerical trouble)
    pub fn solve(&self, q: &QuboMatrix, k: usize) -> Result<Candidate> {
        let n = q.n();
        if k < 1 || k > n {
            return Err(QuboError::Configuration(format!(
                "Cardinality target {} is outside [1, {}]",
                k, n
            )));
        }

        let backend = self.solver.name();
        let request = self.request(q, k);
        debug!(
            backend,
            n,
            k,
            constraints = request.equalities.len(),
            "submitting solve request"
        );

        let output = self.solver.solve(&request)?;

        let (x, objective) = match (output.status, output.x, output.objective) {
            (SolveStatus::Optimal | SolveStatus::Feasible, Some(x), Some(obj)) => (x, obj),
            (SolveStatus::Optimal | SolveStatus::Feasible, _, _) => {
                return Err(QuboError::solver(
                    backend,
                    "solver reported success without a solution",
                ))
            }
            (SolveStatus::Infeasible, _, _) => {
                return Err(QuboError::solver(backend, "problem is infeasible"))
            }
            (SolveStatus::IterationLimit, _, _) => {
                return Err(QuboError::solver(backend, "iteration limit reached"))
            }
            (SolveStatus::TimeLimit, _, _) => {
                return Err(QuboError::solver(backend, "time limit reached"))
            }
            (SolveStatus::NumericalError, _, _) => {
                return Err(QuboError::solver(
                    backend,
                    "solver encountered numerical difficulties",
                ))
            }
        };

        if !objective.is_finite() {
            return Err(QuboError::solver(
                backend,
                format!("solver reported non-finite objective {}", objective),
            ));
        }

        info!(
            backend,
            status = ?output.status,
            objective,
            iterations = output.iterations,
            solve_time = output.solve_time,
            "solver finished"
        );

        Ok(Candidate {
            x,
            objective,
            summary: SolveSummary {
                backend,
                status: output.status,
                iterations: output.iterations,
                solve_time: output.solve_time,
            },
        })
    }
}
