//! Error types for the discrete allocator

use crate::types::AssetId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned to callers of the allocator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AllocatorError {
    /// Target weights do not form a probability distribution
    #[error("Target weights must sum to 1.0, got {sum}")]
    InvalidWeights {
        /// Observed sum of the supplied weights
        sum: f64,
    },

    /// A single target weight is outside [0, 1] or not finite
    #[error("Target weight for {asset} must be within [0, 1], got {weight}")]
    InvalidWeight {
        /// Asset carrying the bad weight
        asset: AssetId,
        /// The offending weight
        weight: f64,
    },

    /// Prices are missing for some requested assets
    #[error("Missing prices for assets: {}", format_ids(.missing))]
    MissingPrice {
        /// Sorted identifiers without a price
        missing: Vec<AssetId>,
    },

    /// A referenced price is not a positive finite number
    #[error("Price for {asset} must be positive, got {price}")]
    InvalidPrice {
        /// Asset carrying the bad price
        asset: AssetId,
        /// The offending price
        price: f64,
    },

    /// Budget is negative or not finite
    #[error("Budget must be a non-negative amount, got {budget}")]
    InvalidBudget {
        /// The offending budget
        budget: f64,
    },

    /// Losses are missing for some weighted assets
    #[error("Missing losses for assets: {}", format_ids(.missing))]
    MissingLoss {
        /// Sorted identifiers without a loss observation
        missing: Vec<AssetId>,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration {
        /// What was wrong with the configuration
        message: String,
    },
}

/// Numerical back-end failures.
///
/// These never escape `Allocator::allocate`; they are absorbed by the relaxed
/// fallback and reported through `AllocationOutcome::Approximate`.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SolverError {
    /// The back end cannot solve this kind of problem
    #[error("Solver unavailable: {reason}")]
    Unavailable {
        /// Why the back end refused
        reason: String,
    },

    /// Branch-and-bound node budget exhausted
    #[error("Node limit reached after {nodes} nodes")]
    NodeLimit {
        /// Nodes explored before giving up
        nodes: u64,
    },

    /// Wall-clock budget exhausted
    #[error("Time limit reached after {elapsed_ms}ms")]
    TimeLimit {
        /// Milliseconds spent before giving up
        elapsed_ms: u64,
    },

    /// No point satisfies the bounds and the budget
    #[error("Problem is infeasible")]
    Infeasible,

    /// Non-finite data or an answer that violates the problem constraints
    #[error("Numerical failure: {reason}")]
    Numerical {
        /// Description of the failure
        reason: String,
    },
}

fn format_ids(ids: &[AssetId]) -> String {
    ids.iter()
        .map(AssetId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Type alias for allocator results
pub type AllocatorResult<T> = Result<T, AllocatorError>;

/// Type alias for solver results
pub type SolverResult<T> = Result<T, SolverError>;
