//! Simulated annealing heuristic.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::{BinaryQuadraticSolver, SolveRequest, SolveStatus, SolverOutput};
use crate::error::{QuboError, Result};
use crate::qubo::QuboMatrix;

const NAME: &str = "annealing";

/// Annealing schedule settings.
#[derive(Debug, Clone)]
pub struct AnnealSettings {
    /// Sweeps per restart; one sweep proposes n moves. Zero runs one sweep.
    pub sweeps: usize,
    /// Independent restarts from random starting points.
    pub restarts: usize,
    /// Starting temperature. Derived from the matrix scale when `None`.
    pub initial_temperature: Option<f64>,
    /// Final temperature as a fraction of the starting temperature.
    pub final_ratio: f64,
    /// RNG seed.
    pub seed: u64,
    /// Time limit in seconds.
    pub time_limit: f64,
}

impl Default for AnnealSettings {
    fn default() -> Self {
        AnnealSettings {
            sweeps: 1_000,
            restarts: 4,
            initial_temperature: None,
            final_ratio: 1e-4,
            seed: 0,
            time_limit: f64::INFINITY,
        }
    }
}

/// Simulated annealing with a geometric cooling schedule.
///
/// Unconstrained requests use single-bit flips. A single `sum(x) == k`
/// constraint is honoured exactly: the walk starts on a random k-subset and
/// only proposes swaps of one selected and one unselected variable. Other
/// constraint shapes are rejected.
#[derive(Debug, Clone, Default)]
pub struct AnnealingSolver {
    pub settings: AnnealSettings,
}

impl AnnealingSolver {
    pub fn new(settings: AnnealSettings) -> Self {
        AnnealingSolver { settings }
    }
}

/// Walk state with cached local fields `h_i = sum_{j != i} Q[i,j] x_j`.
struct Walk<'a> {
    q: &'a QuboMatrix,
    x: Vec<bool>,
    h: Vec<f64>,
    energy: f64,
}

impl<'a> Walk<'a> {
    fn new(q: &'a QuboMatrix, x: Vec<bool>) -> Self {
        let n = q.n();
        let xf: Vec<f64> = x.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect();
        let h = (0..n)
            .map(|i| (0..n).filter(|&j| j != i).map(|j| q.get(i, j) * xf[j]).sum::<f64>())
            .collect();
        let energy = q.energy(&xf);
        Walk { q, x, h, energy }
    }

    fn direction(&self, i: usize) -> f64 {
        if self.x[i] {
            -1.0
        } else {
            1.0
        }
    }

    /// Energy change from flipping bit i.
    fn flip_delta(&self, i: usize) -> f64 {
        self.direction(i) * (self.q.get(i, i) + 2.0 * self.h[i])
    }

    /// Energy change from clearing `on` and setting `off`.
    fn swap_delta(&self, on: usize, off: usize) -> f64 {
        let clear = -(self.q.get(on, on) + 2.0 * self.h[on]);
        let set = self.q.get(off, off) + 2.0 * (self.h[off] - self.q.get(off, on));
        clear + set
    }

    fn flip(&mut self, i: usize, delta: f64) {
        let d = self.direction(i);
        for k in 0..self.h.len() {
            if k != i {
                self.h[k] += self.q.get(k, i) * d;
            }
        }
        self.x[i] = !self.x[i];
        self.energy += delta;
    }
}

impl AnnealingSolver {
    fn starting_temperature(&self, q: &QuboMatrix) -> f64 {
        if let Some(t) = self.settings.initial_temperature {
            return t;
        }
        let n = q.n();
        let scale = (0..n)
            .map(|i| {
                q.get(i, i).abs()
                    + 2.0 * (0..n).filter(|&j| j != i).map(|j| q.get(i, j).abs()).sum::<f64>()
            })
            .fold(0.0_f64, f64::max);
        (scale / 2.0).max(1e-9)
    }
}

impl BinaryQuadraticSolver for AnnealingSolver {
    fn name(&self) -> &'static str {
        NAME
    }

    fn solve(&self, request: &SolveRequest<'_>) -> Result<SolverOutput> {
        request.validate(NAME)?;
        let q = request.q;
        let n = q.n();

        let cardinality = match (request.equalities.is_empty(), request.single_cardinality()) {
            (true, _) => None,
            (false, Some(k)) => Some(k),
            (false, None) => {
                return Err(QuboError::solver(
                    NAME,
                    "only a single sum(x) == k constraint is supported",
                ))
            }
        };
        if cardinality.is_some_and(|k| k > n) {
            return Ok(SolverOutput::failed(SolveStatus::Infeasible));
        }

        let settings = &self.settings;
        let sweeps = settings.sweeps.max(1);
        let start = Instant::now();
        let mut rng = StdRng::seed_from_u64(settings.seed);
        let t0 = self.starting_temperature(q);
        let t_end = t0 * settings.final_ratio.clamp(1e-12, 1.0);
        let cooling = if sweeps > 1 {
            (t_end / t0).powf(1.0 / (sweeps - 1) as f64)
        } else {
            1.0
        };

        let mut best: Option<(Vec<bool>, f64)> = None;
        let mut sweeps_done = 0u64;
        let mut timed_out = false;

        'restarts: for _ in 0..settings.restarts.max(1) {
            let mut order: Vec<usize> = (0..n).collect();
            order.shuffle(&mut rng);
            let mut x = vec![false; n];
            match cardinality {
                Some(k) => order.iter().take(k).for_each(|&i| x[i] = true),
                None => x.iter_mut().for_each(|b| *b = rng.random_bool(0.5)),
            }

            let mut walk = Walk::new(q, x);
            let mut record = |walk: &Walk<'_>| {
                if best.as_ref().map_or(true, |(_, e)| walk.energy < *e) {
                    best = Some((walk.x.clone(), walk.energy));
                }
            };
            record(&walk);

            // k == 0 or k == n leaves no swap to propose.
            let frozen = n == 0 || cardinality.is_some_and(|k| k == 0 || k == n);
            if frozen {
                continue;
            }

            let mut t = t0;
            for _ in 0..sweeps {
                if start.elapsed().as_secs_f64() >= settings.time_limit {
                    timed_out = true;
                    break 'restarts;
                }
                for _ in 0..n {
                    match cardinality {
                        None => {
                            let i = rng.random_range(0..n);
                            let delta = walk.flip_delta(i);
                            if accept(delta, t, &mut rng) {
                                walk.flip(i, delta);
                            }
                        }
                        Some(_) => {
                            let (on, off) = pick_swap(&walk.x, &mut rng);
                            let delta = walk.swap_delta(on, off);
                            if accept(delta, t, &mut rng) {
                                let d_on = walk.flip_delta(on);
                                walk.flip(on, d_on);
                                let d_off = walk.flip_delta(off);
                                walk.flip(off, d_off);
                            }
                        }
                    }
                    record(&walk);
                }
                sweeps_done += 1;
                t *= cooling;
            }
        }

        let elapsed = start.elapsed().as_secs_f64();
        debug!(n, sweeps_done, elapsed, timed_out, "annealing finished");

        let output = match best {
            Some(_) if timed_out && sweeps_done == 0 => SolverOutput::failed(SolveStatus::TimeLimit),
            Some((bits, _)) => {
                let x: Vec<f64> = bits.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect();
                // Re-evaluate to drop accumulated rounding from incremental updates.
                let energy = q.energy(&x);
                SolverOutput::solved(SolveStatus::Feasible, x, energy)
            }
            None => SolverOutput::failed(SolveStatus::Infeasible),
        };
        Ok(output.with_stats(sweeps_done, elapsed))
    }
}

fn accept(delta: f64, temperature: f64, rng: &mut StdRng) -> bool {
    delta <= 0.0 || rng.random::<f64>() < (-delta / temperature).exp()
}

/// Pick a random selected and a random unselected index.
fn pick_swap(x: &[bool], rng: &mut StdRng) -> (usize, usize) {
    let ones: Vec<usize> = (0..x.len()).filter(|&i| x[i]).collect();
    let zeros: Vec<usize> = (0..x.len()).filter(|&i| !x[i]).collect();
    (
        ones[rng.random_range(0..ones.len())],
        zeros[rng.random_range(0..zeros.len())],
    )
}
