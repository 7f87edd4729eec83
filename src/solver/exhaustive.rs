//! Exact solver by complete enumeration.

use std::time::Instant;

use tracing::debug;

use super::{BinaryQuadraticSolver, SolveRequest, SolveStatus, SolverOutput};
use crate::error::{QuboError, Result};

const NAME: &str = "exhaustive";

/// Enumerates every candidate vector and keeps the feasible minimum.
///
/// When the only constraint is `sum(x) == k`, just the `C(n, k)` subsets of
/// size k are visited; otherwise all `2^n` vectors are. Ties keep the vector
/// visited first, so results are deterministic.
#[derive(Debug, Clone)]
pub struct ExhaustiveSolver {
    /// Largest number of variables accepted.
    pub max_variables: usize,
}

impl Default for ExhaustiveSolver {
    fn default() -> Self {
        ExhaustiveSolver { max_variables: 20 }
    }
}

impl ExhaustiveSolver {
    pub fn new(max_variables: usize) -> Self {
        ExhaustiveSolver {
            max_variables: max_variables.min(63),
        }
    }
}

impl BinaryQuadraticSolver for ExhaustiveSolver {
    fn name(&self) -> &'static str {
        NAME
    }

    fn solve(&self, request: &SolveRequest<'_>) -> Result<SolverOutput> {
        request.validate(NAME)?;
        let n = request.n();
        if n > self.max_variables.min(63) {
            return Err(QuboError::solver(
                NAME,
                format!(
                    "{} variables exceed the enumeration limit of {}",
                    n, self.max_variables
                ),
            ));
        }

        let start = Instant::now();
        let mut x = vec![0.0; n];
        let mut best: Option<(u64, f64)> = None;
        let mut visited = 0u64;

        let mut visit = |mask: u64, check: bool| {
            for (i, xi) in x.iter_mut().enumerate() {
                *xi = ((mask >> i) & 1) as f64;
            }
            visited += 1;
            if check && !request.is_feasible(&x) {
                return;
            }
            let e = request.q.energy(&x);
            if best.map_or(true, |(_, b)| e < b) {
                best = Some((mask, e));
            }
        };

        match request.single_cardinality() {
            Some(k) if k <= n => {
                for mask in subsets_of_size(n, k) {
                    visit(mask, false);
                }
            }
            Some(_) => {}
            None => {
                let check = !request.equalities.is_empty();
                for mask in 0..(1u64 << n) {
                    visit(mask, check);
                }
            }
        }

        let elapsed = start.elapsed().as_secs_f64();
        debug!(n, visited, elapsed, "exhaustive enumeration finished");

        let output = match best {
            Some((mask, e)) => {
                let x = (0..n).map(|i| ((mask >> i) & 1) as f64).collect();
                SolverOutput::solved(SolveStatus::Optimal, x, e)
            }
            None => SolverOutput::failed(SolveStatus::Infeasible),
        };
        Ok(output.with_stats(visited, elapsed))
    }
}

/// Iterate bitmasks over `n` bits with exactly `k` set, in increasing order.
fn subsets_of_size(n: usize, k: usize) -> impl Iterator<Item = u64> {
    let limit = 1u64 << n;
    let first = if k == 0 { 0 } else { (1u64 << k) - 1 };
    let mut next = Some(first);
    std::iter::from_fn(move || {
        let mask = next?;
        next = if mask == 0 {
            None
        } else {
            // Gosper's hack
            let c = mask & mask.wrapping_neg();
            let r = mask + c;
            let succ = (((r ^ mask) >> 2) / c) | r;
            (succ < limit).then_some(succ)
        };
        Some(mask)
    })
}
