//! Budget allocation across target weights
//!
//! validate -> exact integer solve, else rounded relaxation -> compose

use crate::config::AllocatorConfig;
use crate::error::{AllocatorResult, SolverError, SolverResult};
use crate::problem::TrackingProblem;
use crate::solver::{BranchAndBoundSolver, ProjectionSolver, QuadraticBackend, Solution, VariableDomain};
use crate::summary::{AllocationSummary, compose};
use crate::types::{AllocationOutcome, Prices, ShareAllocation, TargetWeights};
use crate::validation::validate;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

/// Shares plus the figures derived from them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    /// Share counts, tagged with the solve that produced them
    pub outcome: AllocationOutcome,
    /// Invested amount, remaining cash and per-asset weight errors for the shares
    pub summary: AllocationSummary,
}

impl Allocation {
    /// Shares per asset
    pub fn shares(&self) -> &ShareAllocation {
        self.outcome.shares()
    }

    /// True when the exact solver produced the shares
    pub fn is_exact(&self) -> bool {
        self.outcome.is_exact()
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            AllocationOutcome::Exact { .. } => writeln!(f, "Solve: exact")?,
            AllocationOutcome::Approximate { cause, .. } => {
                writeln!(f, "Solve: approximate (rounded relaxation; {cause})")?
            }
        }
        write!(f, "{}", self.summary)
    }
}

/// Whole-share allocator
pub struct Allocator {
    config: AllocatorConfig,
    exact: Box<dyn QuadraticBackend>,
    relaxed: ProjectionSolver,
}

impl fmt::Debug for Allocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Allocator")
            .field("config", &self.config)
            .field("exact_backend", &self.exact.name())
            .finish()
    }
}

impl Allocator {
    /// Allocator with the built-in branch-and-bound back end
    pub fn new(config: AllocatorConfig) -> Self {
        let exact = BranchAndBoundSolver::new(config.solver.clone());
        Self::with_backend(config, exact)
    }

    /// Allocator with a custom exact back end
    pub fn with_backend(config: AllocatorConfig, backend: impl QuadraticBackend + 'static) -> Self {
        let relaxed = ProjectionSolver::new(config.solver.bisection_iterations);
        Self {
            config,
            exact: Box::new(backend),
            relaxed,
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Allocate `budget` across `weights` in whole shares.
    ///
    /// Only validation failures are returned as errors. Solver failures fall
    /// back to the rounded relaxation, whose cost is not re-checked against
    /// the budget.
    pub fn allocate(
        &self,
        budget: f64,
        weights: &TargetWeights,
        prices: &Prices,
    ) -> AllocatorResult<Allocation> {
        validate(budget, weights, prices, self.config.weight_tolerance)?;

        let problem = TrackingProblem::new(budget, weights, prices);
        let outcome = if budget == 0.0 {
            debug!("Zero budget, returning empty allocation for {} assets", problem.len());
            AllocationOutcome::Exact {
                shares: to_share_map(&problem, &Solution::zeros(&problem)),
            }
        } else {
            match self.solve_exact(&problem) {
                Ok(solution) => AllocationOutcome::Exact {
                    shares: to_share_map(&problem, &solution),
                },
                Err(cause) => {
                    warn!(
                        "Exact solver {} failed ({}), using rounded relaxation",
                        self.exact.name(),
                        cause
                    );
                    AllocationOutcome::Approximate {
                        shares: self.solve_relaxed(&problem),
                        cause,
                    }
                }
            }
        };

        let summary = compose(outcome.shares(), weights, prices, budget);
        info!(
            "Allocated {:.2} of {:.2} across {} assets (exact: {}, tracking error {:.3e})",
            summary.invested_amount,
            budget,
            problem.len(),
            outcome.is_exact(),
            summary.tracking_error
        );

        Ok(Allocation { outcome, summary })
    }

    fn solve_exact(&self, problem: &TrackingProblem) -> SolverResult<Solution> {
        if !self.config.solver.exact_enabled {
            return Err(SolverError::Unavailable {
                reason: "exact solver disabled by configuration".to_string(),
            });
        }

        let solution = self.exact.solve(problem, VariableDomain::Integer)?;
        check_exact(problem, &solution, self.config.solver.integrality_tolerance)?;
        debug!(
            "Exact solve: objective {:.3e} after {} nodes",
            solution.objective, solution.nodes
        );
        Ok(solution)
    }

    fn solve_relaxed(&self, problem: &TrackingProblem) -> ShareAllocation {
        match self.relaxed.solve(problem, VariableDomain::Continuous) {
            Ok(solution) => to_share_map(problem, &solution),
            Err(e) => {
                warn!("Relaxation failed ({}), returning empty allocation", e);
                to_share_map(problem, &Solution::zeros(problem))
            }
        }
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new(AllocatorConfig::default())
    }
}

/// Allocate with the default configuration
pub fn allocate(budget: f64, weights: &TargetWeights, prices: &Prices) -> AllocatorResult<Allocation> {
    Allocator::default().allocate(budget, weights, prices)
}

/// An exact answer must be whole, non-negative and affordable
fn check_exact(problem: &TrackingProblem, solution: &Solution, tolerance: f64) -> SolverResult<()> {
    if solution.shares.len() != problem.len() {
        return Err(SolverError::Numerical {
            reason: format!(
                "expected {} share values, got {}",
                problem.len(),
                solution.shares.len()
            ),
        });
    }
    if let Some(x) = solution
        .shares
        .iter()
        .find(|x| !x.is_finite() || **x < 0.0 || (**x - x.round()).abs() > tolerance)
    {
        return Err(SolverError::Numerical {
            reason: format!("share value {x} is not a non-negative integer"),
        });
    }
    let whole = solution.shares.map(f64::round);
    if !problem.is_affordable(&whole) {
        return Err(SolverError::Numerical {
            reason: format!(
                "cost {:.2} exceeds budget {:.2}",
                problem.cost(&whole),
                problem.budget()
            ),
        });
    }
    Ok(())
}

/// Round each share to the nearest integer and clamp negatives to zero
fn to_share_map(problem: &TrackingProblem, solution: &Solution) -> ShareAllocation {
    problem
        .assets()
        .iter()
        .zip(solution.shares.iter())
        .map(|(asset, x)| {
            let rounded = x.round().max(0.0);
            // SAFETY: rounded is finite and non-negative
            (asset.clone(), rounded as u64)
        })
        .collect()
}
