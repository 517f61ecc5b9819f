//! Exact integer solver
//!
//! Best-first branch-and-bound over whole-share bounds. Each node is bounded
//! from below by its continuous relaxation; the incumbent starts from a
//! round-down-and-fill heuristic and is refreshed at every node.

use super::{ProjectionSolver, QuadraticBackend, Solution, VariableDomain};
use crate::config::SolverConfig;
use crate::error::{SolverError, SolverResult};
use crate::problem::TrackingProblem;
use nalgebra::DVector;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;
use tracing::debug;

/// Nodes whose bound is within this gap of the incumbent are not explored
const OPTIMALITY_GAP: f64 = 1e-12;

/// Branch-and-bound integer solver
#[derive(Debug, Clone)]
pub struct BranchAndBoundSolver {
    config: SolverConfig,
    relaxation: ProjectionSolver,
}

/// Open subproblem
#[derive(Debug)]
struct Node {
    lower: DVector<f64>,
    upper: DVector<f64>,
    relaxed: DVector<f64>,
    bound: f64,
    seq: u64,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Node {}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    // Reversed so the max-heap pops the smallest bound, oldest first on ties
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .bound
            .total_cmp(&self.bound)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Best integer point found so far
struct Incumbent {
    shares: DVector<f64>,
    objective: f64,
}

impl Incumbent {
    fn offer(&mut self, shares: DVector<f64>, objective: f64) {
        if objective < self.objective {
            self.shares = shares;
            self.objective = objective;
        }
    }
}

impl BranchAndBoundSolver {
    /// Create a solver from configuration
    pub fn new(config: SolverConfig) -> Self {
        let relaxation = ProjectionSolver::new(config.bisection_iterations);
        Self { config, relaxation }
    }

    /// Solver configuration
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn solve_integer(&self, problem: &TrackingProblem) -> SolverResult<Solution> {
        if problem.budget() <= 0.0 || problem.is_empty() {
            return Ok(Solution::zeros(problem));
        }

        let started = Instant::now();
        let n = problem.len();
        let lower = DVector::zeros(n);
        let upper = DVector::from_iterator(n, problem.share_caps().into_iter().map(|c| c as f64));

        let zero = Solution::zeros(problem);
        let mut incumbent = Incumbent {
            shares: zero.shares,
            objective: zero.objective,
        };

        let root = self.relaxation.solve_bounded(problem, &lower, &upper)?;
        if let Some((shares, objective)) = round_down_and_fill(problem, &root.shares, &lower, &upper)
        {
            incumbent.offer(shares, objective);
        }

        let mut seq = 0_u64;
        let mut open = BinaryHeap::new();
        open.push(Node {
            lower,
            upper,
            relaxed: root.shares,
            bound: root.objective,
            seq,
        });

        let tolerance = self.config.integrality_tolerance;
        let mut nodes = 0_u64;

        while let Some(node) = open.pop() {
            if node.bound >= incumbent.objective - OPTIMALITY_GAP {
                break;
            }

            nodes += 1;
            if nodes > self.config.max_nodes {
                return Err(SolverError::NodeLimit { nodes: nodes - 1 });
            }
            if let Some(limit) = self.config.time_limit_ms {
                let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                if elapsed_ms >= limit {
                    return Err(SolverError::TimeLimit { elapsed_ms });
                }
            }

            let Some((index, split)) = branching_variable(problem, &node, tolerance) else {
                // Integral relaxation that is also affordable
                let shares = node.relaxed.map(f64::round);
                let objective = problem.objective(&shares);
                incumbent.offer(shares, objective);
                continue;
            };

            let mut down_upper = node.upper.clone();
            down_upper[index] = split;
            let mut up_lower = node.lower.clone();
            up_lower[index] = split + 1.0;

            for (lower, upper) in [
                (node.lower.clone(), down_upper),
                (up_lower, node.upper.clone()),
            ] {
                if lower[index] > upper[index] {
                    continue;
                }
                let relaxed = match self.relaxation.solve_bounded(problem, &lower, &upper) {
                    Ok(relaxed) => relaxed,
                    Err(SolverError::Infeasible) => continue,
                    Err(e) => return Err(e),
                };
                if relaxed.objective >= incumbent.objective - OPTIMALITY_GAP {
                    continue;
                }
                if let Some((shares, objective)) =
                    round_down_and_fill(problem, &relaxed.shares, &lower, &upper)
                {
                    incumbent.offer(shares, objective);
                }

                seq += 1;
                open.push(Node {
                    lower,
                    upper,
                    relaxed: relaxed.shares,
                    bound: relaxed.objective,
                    seq,
                });
            }
        }

        debug!(
            "Branch-and-bound finished: {} nodes, objective {:.3e}, {}us",
            nodes,
            incumbent.objective,
            started.elapsed().as_micros()
        );

        Ok(Solution {
            shares: incumbent.shares,
            objective: incumbent.objective,
            nodes,
        })
    }
}

impl QuadraticBackend for BranchAndBoundSolver {
    fn name(&self) -> &str {
        "branch-and-bound"
    }

    fn solve(&self, problem: &TrackingProblem, domain: VariableDomain) -> SolverResult<Solution> {
        match domain {
            VariableDomain::Integer => self.solve_integer(problem),
            VariableDomain::Continuous => self.relaxation.solve(problem, domain),
        }
    }
}

/// Pick the variable to split on and the value of its down-branch upper bound.
///
/// Prefers the most fractional share. When every share is integral within
/// tolerance but the rounded point overshoots the budget, splits the first
/// free variable at its rounded value so the up-branch pins it there.
/// Returns `None` when the rounded relaxation is an affordable integer point.
fn branching_variable(problem: &TrackingProblem, node: &Node, tolerance: f64) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64, f64)> = None;
    for (i, x) in node.relaxed.iter().enumerate() {
        if node.lower[i] >= node.upper[i] {
            continue;
        }
        let distance = (x - x.round()).abs();
        if distance > tolerance && best.is_none_or(|(_, _, d)| distance > d) {
            best = Some((i, x.floor(), distance));
        }
    }
    if let Some((index, split, _)) = best {
        return Some((index, split));
    }

    let rounded = node.relaxed.map(f64::round);
    if problem.is_affordable(&rounded) {
        return None;
    }
    rounded
        .iter()
        .enumerate()
        .find(|(i, r)| node.lower[*i] < node.upper[*i] && **r > node.lower[*i])
        .map(|(i, r)| (i, r - 1.0))
}

/// Feasible integer point near a relaxed solution.
///
/// Floors every share inside the node bounds, then keeps buying the single
/// share that lowers the objective most while the budget allows it.
fn round_down_and_fill(
    problem: &TrackingProblem,
    relaxed: &DVector<f64>,
    lower: &DVector<f64>,
    upper: &DVector<f64>,
) -> Option<(DVector<f64>, f64)> {
    let mut shares = DVector::from_iterator(
        relaxed.len(),
        relaxed
            .iter()
            .zip(lower.iter().zip(upper.iter()))
            .map(|(x, (l, u))| x.floor().max(*l).min(*u)),
    );
    let mut cost = problem.cost(&shares);
    if cost > problem.budget() {
        return None;
    }

    let scale = problem.share_weights();
    let targets = problem.targets();
    let prices = problem.prices();
    loop {
        let mut step: Option<(usize, f64)> = None;
        for i in 0..shares.len() {
            if shares[i] + 1.0 > upper[i] || cost + prices[i] > problem.budget() {
                continue;
            }
            let error = shares[i] * scale[i] - targets[i];
            let delta = scale[i] * (2.0 * error + scale[i]);
            if delta < 0.0 && step.is_none_or(|(_, d)| delta < d) {
                step = Some((i, delta));
            }
        }
        let Some((i, _)) = step else { break };
        shares[i] += 1.0;
        cost = problem.cost(&shares);
    }

    if cost > problem.budget() {
        return None;
    }
    let objective = problem.objective(&shares);
    Some((shares, objective))
}
