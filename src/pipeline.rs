//! Encode, solve, decode for a single problem.
//!
//! ```ignore
//! let result = Pipeline::new(BranchAndBoundSolver::default(), ConstraintMode::Constrained)
//!     .run(&params)?;
//! println!("{}", result.bitstring());
//! ```

use tracing::{info, warn};

use crate::config::PortfolioConfig;
use crate::decode::{PortfolioResult, ResultDecoder};
use crate::error::Result;
use crate::problem::{ConstraintMode, ProblemParameters};
use crate::qubo::build_qubo;
use crate::solver::{BinaryQuadraticSolver, SolverAdapter};

/// Relative tolerance for the reported-vs-recomputed objective check.
const OBJECTIVE_GAP_TOL: f64 = 1e-6;

/// The strictly linear QUBO pipeline. Holds no per-problem state, so one
/// instance can run any number of problems.
#[derive(Debug)]
pub struct Pipeline {
    adapter: SolverAdapter,
    decoder: ResultDecoder,
}

impl Pipeline {
    /// Create a pipeline around a solver backend.
    pub fn new(solver: impl BinaryQuadraticSolver + 'static, mode: ConstraintMode) -> Self {
        Self::from_adapter(SolverAdapter::new(solver, mode))
    }

    pub fn from_adapter(adapter: SolverAdapter) -> Self {
        Pipeline {
            adapter,
            decoder: ResultDecoder::default(),
        }
    }

    /// Create the pipeline described by a configuration file.
    pub fn from_config(config: &PortfolioConfig) -> Result<Self> {
        let solver = config.solver.build_solver()?;
        Ok(Self::from_adapter(SolverAdapter::from_boxed(solver, config.mode)))
    }

    /// Replace the decoder (e.g. to change the binary tolerance).
    pub fn with_decoder(mut self, decoder: ResultDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn adapter(&self) -> &SolverAdapter {
        &self.adapter
    }

    /// Run the pipeline.
    ///
    /// # Errors
    ///
    /// Propagates configuration, solver and decoding errors unchanged.
    pub fn run(&self, params: &ProblemParameters) -> Result<PortfolioResult> {
        let k = params.cardinality();
        let mode = self.adapter.mode();

        if mode == ConstraintMode::Penalty && params.penalty() == 0.0 {
            warn!("penalty mode with zero penalty weight: cardinality is unconstrained");
        }

        let q = build_qubo(params)?;
        info!(
            n = q.n(),
            k,
            risk_aversion = params.risk_aversion(),
            penalty = params.penalty(),
            "built QUBO matrix"
        );

        let candidate = self.adapter.solve(&q, k)?;

        let mut result = self.decoder.decode_with_reported(
            params.assets(),
            &candidate.x,
            &q,
            candidate.objective,
        )?;
        result.summary = Some(candidate.summary);

        if result.cardinality() != k {
            warn!(
                selected = result.cardinality(),
                k,
                %mode,
                "selection size differs from cardinality target"
            );
        }
        if let Some(gap) = result.objective_gap() {
            if gap > OBJECTIVE_GAP_TOL * result.objective.abs().max(1.0) {
                warn!(
                    reported = candidate.objective,
                    recomputed = result.objective,
                    "solver objective disagrees with recomputed objective"
                );
            }
        }

        info!(
            bitstring = %result.bitstring(),
            objective = result.objective,
            "decoded selection"
        );
        Ok(result)
    }
}
