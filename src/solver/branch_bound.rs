//! Exact branch and bound over convexified QP relaxations.

use std::time::Instant;

use tracing::{debug, trace};

use super::relaxation::{NodeRelaxation, Relaxation};
use super::{BinaryQuadraticSolver, SolveRequest, SolveStatus, SolverOutput};
use crate::error::Result;

const NAME: &str = "branch_and_bound";

/// Branch and bound settings.
#[derive(Debug, Clone)]
pub struct BranchBoundSettings {
    /// Maximum number of explored nodes.
    pub max_nodes: u64,
    /// Time limit in seconds.
    pub time_limit: f64,
    /// Added to `-λ_min(Q)` when convexifying the relaxation.
    pub convexity_margin: f64,
    /// A relaxed value within this distance of 0 or 1 counts as integral.
    pub integrality_tol: f64,
    /// Maximum interior point iterations per relaxation.
    pub qp_max_iter: u32,
}

impl Default for BranchBoundSettings {
    fn default() -> Self {
        BranchBoundSettings {
            max_nodes: 100_000,
            time_limit: f64::INFINITY,
            convexity_margin: 1e-6,
            integrality_tol: 1e-6,
            qp_max_iter: 200,
        }
    }
}

/// Depth-first branch and bound. Each node is bounded by a convex QP
/// relaxation solved with Clarabel; leaves are evaluated exactly.
#[derive(Debug, Clone, Default)]
pub struct BranchAndBoundSolver {
    pub settings: BranchBoundSettings,
}

impl BranchAndBoundSolver {
    pub fn new(settings: BranchBoundSettings) -> Self {
        BranchAndBoundSolver { settings }
    }
}

struct Incumbent {
    bits: Vec<bool>,
    energy: f64,
}

impl BinaryQuadraticSolver for BranchAndBoundSolver {
    fn name(&self) -> &'static str {
        NAME
    }

    fn solve(&self, request: &SolveRequest<'_>) -> Result<SolverOutput> {
        request.validate(NAME)?;
        let start = Instant::now();
        let n = request.n();
        let settings = &self.settings;
        let relax = Relaxation::new(request, settings.convexity_margin, settings.qp_max_iter);
        let cardinality = request.single_cardinality();

        debug!(n, delta = relax.delta(), "starting branch and bound");

        let mut best: Option<Incumbent> = None;
        let mut stack: Vec<Vec<Option<bool>>> = vec![vec![None; n]];
        let mut nodes = 0u64;

        let finish = |status: SolveStatus, best: Option<Incumbent>, nodes: u64| {
            let elapsed = start.elapsed().as_secs_f64();
            let output = match (status, best) {
                (SolveStatus::Optimal, Some(inc)) => {
                    SolverOutput::solved(status, to_vector(&inc.bits), inc.energy)
                }
                (SolveStatus::Optimal, None) => SolverOutput::failed(SolveStatus::Infeasible),
                (status, _) => SolverOutput::failed(status),
            };
            debug!(nodes, elapsed, status = ?output.status, "branch and bound finished");
            output.with_stats(nodes, elapsed)
        };

        while let Some(fixed) = stack.pop() {
            if nodes >= settings.max_nodes {
                return Ok(finish(SolveStatus::IterationLimit, best, nodes));
            }
            let elapsed = start.elapsed().as_secs_f64();
            if elapsed >= settings.time_limit {
                return Ok(finish(SolveStatus::TimeLimit, best, nodes));
            }
            nodes += 1;

            if let Some(k) = cardinality {
                if !cardinality_reachable(&fixed, k) {
                    continue;
                }
            }

            if fixed.iter().all(Option::is_some) {
                let bits: Vec<bool> = fixed.iter().map(|f| f.unwrap_or(false)).collect();
                offer(request, &mut best, bits);
                continue;
            }

            let (x, bound) = match relax.solve_node(&fixed, settings.time_limit - elapsed)? {
                NodeRelaxation::Solved { x, bound } => (x, bound),
                NodeRelaxation::Infeasible => continue,
                NodeRelaxation::TimedOut => {
                    return Ok(finish(SolveStatus::TimeLimit, best, nodes))
                }
                NodeRelaxation::Failed(status) => {
                    debug!(%status, "relaxation failed");
                    return Ok(finish(SolveStatus::NumericalError, best, nodes));
                }
            };

            if let Some(inc) = &best {
                if bound >= inc.energy - prune_tol(inc.energy) {
                    trace!(bound, incumbent = inc.energy, "pruned");
                    continue;
                }
            }

            if let Some(bits) = round_relaxation(&x, &fixed, cardinality) {
                offer(request, &mut best, bits);
            }

            // Branch on the most fractional free variable.
            let branch = fixed
                .iter()
                .enumerate()
                .filter(|(_, f)| f.is_none())
                .map(|(j, _)| (j, x[j].min(1.0 - x[j])))
                .max_by(|a, b| a.1.total_cmp(&b.1));

            let Some((j, dist)) = branch else { continue };
            if dist <= settings.integrality_tol {
                // Integral relaxation: its rounding was offered above and is
                // optimal for this node.
                let bits = complete(&fixed, &x);
                if request.is_feasible(&to_vector(&bits)) {
                    offer(request, &mut best, bits);
                    continue;
                }
            }

            // Push the branch away from the relaxed value first so the
            // closer one is explored next.
            let prefer_one = x[j] >= 0.5;
            for value in [!prefer_one, prefer_one] {
                let mut child = fixed.clone();
                child[j] = Some(value);
                stack.push(child);
            }
        }

        Ok(finish(SolveStatus::Optimal, best, nodes))
    }
}

fn to_vector(bits: &[bool]) -> Vec<f64> {
    bits.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect()
}

fn prune_tol(incumbent: f64) -> f64 {
    1e-9 * incumbent.abs().max(1.0)
}

/// Replace the incumbent if `bits` is feasible and strictly better.
fn offer(request: &SolveRequest<'_>, best: &mut Option<Incumbent>, bits: Vec<bool>) {
    let x = to_vector(&bits);
    if !request.is_feasible(&x) {
        return;
    }
    let energy = request.q.energy(&x);
    if best.as_ref().map_or(true, |inc| energy < inc.energy) {
        trace!(energy, "new incumbent");
        *best = Some(Incumbent { bits, energy });
    }
}

/// Whether `sum(x) == k` can still be met given the fixed variables.
fn cardinality_reachable(fixed: &[Option<bool>], k: usize) -> bool {
    let ones = fixed.iter().filter(|f| **f == Some(true)).count();
    let free = fixed.iter().filter(|f| f.is_none()).count();
    ones <= k && ones + free >= k
}

/// Fixed values, free variables rounded at 0.5.
fn complete(fixed: &[Option<bool>], x: &[f64]) -> Vec<bool> {
    fixed
        .iter()
        .zip(x)
        .map(|(f, &v)| f.unwrap_or(v >= 0.5))
        .collect()
}

/// Round a relaxed point to a candidate vector. Under a cardinality
/// constraint the free variables with the largest relaxed values fill the
/// remaining slots.
fn round_relaxation(
    x: &[f64],
    fixed: &[Option<bool>],
    cardinality: Option<usize>,
) -> Option<Vec<bool>> {
    let Some(k) = cardinality else {
        return Some(complete(fixed, x));
    };

    let ones = fixed.iter().filter(|f| **f == Some(true)).count();
    let mut free: Vec<usize> = (0..fixed.len()).filter(|&j| fixed[j].is_none()).collect();
    let need = k.checked_sub(ones)?;
    if need > free.len() {
        return None;
    }
    free.sort_by(|&a, &b| x[b].total_cmp(&x[a]).then(a.cmp(&b)));

    let mut bits: Vec<bool> = fixed.iter().map(|f| f.unwrap_or(false)).collect();
    for &j in free.iter().take(need) {
        bits[j] = true;
    }
    Some(bits)
}
