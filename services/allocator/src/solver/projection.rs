//! Continuous relaxation solver
//!
//! With `y_i = x_i * p_i / B` the relaxation is the Euclidean projection of the
//! target weights onto `{ l <= y <= u, Σ y <= 1 }`. Its KKT point is
//! `y_i = clamp(w_i - λ, l_i, u_i)` for the smallest `λ >= 0` that satisfies
//! the budget row; `λ` is found by bisection.

use super::{QuadraticBackend, Solution, VariableDomain};
use crate::config::DEFAULT_BISECTION_ITERATIONS;
use crate::error::{SolverError, SolverResult};
use crate::problem::TrackingProblem;
use nalgebra::DVector;

/// Closed-form continuous solver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionSolver {
    iterations: u32,
}

impl ProjectionSolver {
    /// Create a solver with the given number of bisection steps
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    /// Solve the relaxation with per-variable share bounds.
    ///
    /// `upper` may hold `f64::INFINITY`. Returns `Infeasible` when the lower
    /// bounds alone cost more than the budget.
    pub fn solve_bounded(
        &self,
        problem: &TrackingProblem,
        lower: &DVector<f64>,
        upper: &DVector<f64>,
    ) -> SolverResult<Solution> {
        if problem.budget() <= 0.0 || problem.is_empty() {
            return Ok(Solution::zeros(problem));
        }
        if problem.cost(lower) > problem.budget() {
            return Err(SolverError::Infeasible);
        }

        let scale = problem.share_weights();
        let targets = problem.targets();
        if scale.iter().chain(targets.iter()).any(|v| !v.is_finite()) {
            return Err(SolverError::Numerical {
                reason: "non-finite problem data".to_string(),
            });
        }

        let lo = lower.component_mul(&scale);
        let hi = upper.component_mul(&scale);
        let project = |lambda: f64| -> DVector<f64> {
            DVector::from_iterator(
                targets.len(),
                targets
                    .iter()
                    .zip(lo.iter().zip(hi.iter()))
                    .map(|(w, (l, u))| (w - lambda).max(*l).min(*u)),
            )
        };

        let mut weights = project(0.0);
        if weights.sum() > 1.0 {
            let mut low = 0.0_f64;
            let mut high = targets
                .iter()
                .zip(lo.iter())
                .map(|(w, l)| w - l)
                .fold(0.0_f64, f64::max);
            for _ in 0..self.iterations {
                let mid = 0.5 * (low + high);
                if project(mid).sum() > 1.0 {
                    low = mid;
                } else {
                    high = mid;
                }
            }
            weights = project(high);
        }

        let shares = DVector::from_iterator(
            weights.len(),
            weights
                .iter()
                .zip(scale.iter())
                .zip(lower.iter().zip(upper.iter()))
                .map(|((y, s), (l, u))| (y / s).max(*l).min(*u)),
        );
        if shares.iter().any(|x| !x.is_finite()) {
            return Err(SolverError::Numerical {
                reason: "relaxation produced non-finite shares".to_string(),
            });
        }

        let objective = problem.objective(&shares);
        Ok(Solution {
            shares,
            objective,
            nodes: 0,
        })
    }
}

impl Default for ProjectionSolver {
    fn default() -> Self {
        Self::new(DEFAULT_BISECTION_ITERATIONS)
    }
}

impl QuadraticBackend for ProjectionSolver {
    fn name(&self) -> &str {
        "projection"
    }

    fn solve(&self, problem: &TrackingProblem, domain: VariableDomain) -> SolverResult<Solution> {
        match domain {
            VariableDomain::Continuous => {
                let lower = DVector::zeros(problem.len());
                let upper = DVector::from_element(problem.len(), f64::INFINITY);
                self.solve_bounded(problem, &lower, &upper)
            }
            VariableDomain::Integer => Err(SolverError::Unavailable {
                reason: "projection solver handles continuous shares only".to_string(),
            }),
        }
    }
}
