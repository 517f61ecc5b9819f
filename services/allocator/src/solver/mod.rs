//! Numerical back ends for the tracking problem
//!
//! The allocator only talks to `QuadraticBackend`, so the exact solver can be
//! replaced without touching validation or result composition.

pub mod branch_bound;
pub mod projection;

pub use branch_bound::BranchAndBoundSolver;
pub use projection::ProjectionSolver;

use crate::error::SolverResult;
use crate::problem::TrackingProblem;
use nalgebra::DVector;

/// Domain of the share variables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableDomain {
    /// Whole shares only
    Integer,
    /// Fractional shares allowed
    Continuous,
}

/// Solver output in the problem's asset order
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Share count per variable
    pub shares: DVector<f64>,
    /// Objective value at `shares`
    pub objective: f64,
    /// Branch-and-bound nodes explored (0 for direct solves)
    pub nodes: u64,
}

impl Solution {
    /// Empty holding for a problem
    pub fn zeros(problem: &TrackingProblem) -> Self {
        let shares = DVector::zeros(problem.len());
        let objective = problem.objective(&shares);
        Self {
            shares,
            objective,
            nodes: 0,
        }
    }
}

/// Minimizes the tracking quadratic under the budget constraint
pub trait QuadraticBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Solve `problem` over the given variable domain
    fn solve(&self, problem: &TrackingProblem, domain: VariableDomain) -> SolverResult<Solution>;
}
