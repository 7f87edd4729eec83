//! Convexified continuous relaxation of a binary quadratic program, solved
//! with Clarabel.
//!
//! For binary x, `x_i^2 == x_i`, so adding `δ (x_i^2 - x_i)` leaves x'Qx
//! unchanged on {0,1}^n while shifting the Hessian by `2δI`. With
//! `δ >= -λ_min(Q)` the relaxation
//!
//! ```text
//! minimize    x'(Q + δI)x - δ sum(x)
//! subject to  a_i · x == b_i,  x_j == v_j (fixed),  0 <= x <= 1
//! ```
//!
//! is a convex QP. On the box `x_i^2 <= x_i`, so its optimum lower-bounds
//! the binary optimum of every node.

use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use nalgebra::DMatrix;
use nalgebra_sparse::CscMatrix;

use super::SolveRequest;
use crate::error::{QuboError, Result};
use crate::sparse::{csc_from_triplets, to_clarabel_csc, upper_triangle_csc};

/// Result of solving one node relaxation.
#[derive(Debug, Clone)]
pub(crate) enum NodeRelaxation {
    /// Relaxation solved; `bound` lower-bounds every completion of the node.
    Solved { x: Vec<f64>, bound: f64 },
    /// No point of the box satisfies the node's constraints.
    Infeasible,
    /// The time budget ran out inside the QP solver.
    TimedOut,
    /// Clarabel stopped with another status.
    Failed(String),
}

/// Per-request data shared by every node.
pub(crate) struct Relaxation<'a> {
    request: &'a SolveRequest<'a>,
    /// Upper triangle of `2 (Q + δI)`, Clarabel's `P`.
    p: CscMatrix<f64>,
    delta: f64,
    max_iter: u32,
}

impl<'a> Relaxation<'a> {
    /// Convexify the request's objective. `margin` is added to the diagonal
    /// shift on top of `-λ_min(Q)`.
    pub(crate) fn new(request: &'a SolveRequest<'a>, margin: f64, max_iter: u32) -> Self {
        let q = request.q;
        let n = q.n();
        let delta = (-q.min_eigenvalue()).max(0.0) + margin;

        let mut shifted: DMatrix<f64> = q.as_matrix().clone();
        for i in 0..n {
            shifted[(i, i)] += delta;
        }

        Relaxation {
            request,
            p: upper_triangle_csc(&shifted, 2.0),
            delta,
            max_iter,
        }
    }

    /// Diagonal shift applied to Q.
    pub(crate) fn delta(&self) -> f64 {
        self.delta
    }

    /// Relaxation objective at `x`.
    pub(crate) fn objective(&self, x: &[f64]) -> f64 {
        let correction: f64 = x.iter().map(|xi| xi * xi - xi).sum();
        self.request.q.energy(x) + self.delta * correction
    }

    /// Solve the relaxation with the variables in `fixed` pinned.
    pub(crate) fn solve_node(
        &self,
        fixed: &[Option<bool>],
        time_limit: f64,
    ) -> Result<NodeRelaxation> {
        let n = self.request.n();
        let q_lin = vec![-self.delta; n];

        // Zero cone rows: request equalities, then fixed variables.
        // Nonnegative rows: x_j <= 1 and -x_j <= 0 for each free variable.
        let mut triplets = Vec::new();
        let mut b = Vec::new();
        let mut row = 0;

        for eq in &self.request.equalities {
            for (j, &c) in eq.coeffs.iter().enumerate() {
                if c != 0.0 {
                    triplets.push((row, j, c));
                }
            }
            b.push(eq.rhs);
            row += 1;
        }
        for (j, f) in fixed.iter().enumerate() {
            if let Some(v) = f {
                triplets.push((row, j, 1.0));
                b.push(if *v { 1.0 } else { 0.0 });
                row += 1;
            }
        }
        let zero = row;

        for (j, f) in fixed.iter().enumerate() {
            if f.is_none() {
                triplets.push((row, j, 1.0));
                b.push(1.0);
                triplets.push((row + 1, j, -1.0));
                b.push(0.0);
                row += 2;
            }
        }
        let nonneg = row - zero;

        let mut cones = Vec::new();
        if zero > 0 {
            cones.push(SupportedConeT::ZeroConeT(zero));
        }
        if nonneg > 0 {
            cones.push(SupportedConeT::NonnegativeConeT(nonneg));
        }

        let a: CscMatrix<f64> = csc_from_triplets(row, n, triplets);
        let p = to_clarabel_csc(&self.p);
        let a = to_clarabel_csc(&a);

        let settings = DefaultSettingsBuilder::default()
            .verbose(false)
            .max_iter(self.max_iter)
            .time_limit(time_limit.max(0.0))
            .build()
            .map_err(|e| {
                QuboError::solver("branch_and_bound", format!("Invalid QP settings: {:?}", e))
            })?;

        let mut solver = DefaultSolver::new(&p, &q_lin, &a, &b, &cones, settings);
        solver.solve();

        let outcome = match solver.solution.status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => {
                let x: Vec<f64> = solver
                    .solution
                    .x
                    .iter()
                    .map(|v| v.clamp(0.0, 1.0))
                    .collect();
                let bound = self.objective(&x);
                NodeRelaxation::Solved { x, bound }
            }
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                NodeRelaxation::Infeasible
            }
            SolverStatus::MaxTime => NodeRelaxation::TimedOut,
            other => NodeRelaxation::Failed(format!("{:?}", other)),
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qubo::QuboMatrix;
    use crate::solver::LinearEquality;

    #[test]
    fn test_delta_makes_hessian_psd() {
        let q = QuboMatrix::from_upper(DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 0.0]));
        let req = SolveRequest::new(&q);
        let relax = Relaxation::new(&req, 1e-3, 200);
        assert!((relax.delta() - 1.001).abs() < 1e-9);
    }

    #[test]
    fn test_objective_matches_energy_on_binaries() {
        let q = QuboMatrix::from_upper(DMatrix::from_row_slice(2, 2, &[-1.0, 3.0, 3.0, 2.0]));
        let req = SolveRequest::new(&q);
        let relax = Relaxation::new(&req, 1e-3, 200);
        for x in [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]] {
            assert!((relax.objective(&x) - q.energy(&x)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_relaxation_bounds_binary_optimum() {
        // Binary optimum under sum(x) == 1 is -2 at x = [0, 1]
        let q = QuboMatrix::from_upper(DMatrix::from_row_slice(2, 2, &[-1.0, 3.0, 3.0, -2.0]));
        let req = SolveRequest::new(&q).with_equality(LinearEquality::cardinality(2, 1));
        let relax = Relaxation::new(&req, 1e-3, 200);
        match relax.solve_node(&[None, None], f64::INFINITY).unwrap() {
            NodeRelaxation::Solved { bound, .. } => assert!(bound <= -2.0 + 1e-6),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_fixed_variable_respected() {
        let q = QuboMatrix::from_upper(DMatrix::identity(2, 2));
        let req = SolveRequest::new(&q).with_equality(LinearEquality::cardinality(2, 1));
        let relax = Relaxation::new(&req, 1e-3, 200);
        let out = relax
            .solve_node(&[Some(true), None], f64::INFINITY)
            .unwrap();
        // x0 = 1 forces x1 = 0
        match out {
            NodeRelaxation::Solved { x, .. } => {
                assert!((x[0] - 1.0).abs() < 1e-5);
                assert!(x[1].abs() < 1e-5);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
