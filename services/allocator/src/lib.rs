//! Discrete Allocator
//!
//! Splits a cash budget into whole shares so holdings track target weights:
//! minimize the summed squared weight error subject to the budget. An exact
//! branch-and-bound solve is tried first; if it is unavailable or fails, the
//! continuous relaxation is solved and rounded instead, and the result is
//! tagged as approximate.

#![warn(missing_docs)]

pub mod allocator;
pub mod config;
pub mod error;
pub mod problem;
pub mod solver;
pub mod summary;
pub mod types;
pub mod validation;
pub mod weights;

pub use allocator::{Allocation, Allocator, allocate};
pub use config::{AllocatorConfig, SolverConfig};
pub use error::{AllocatorError, AllocatorResult, SolverError, SolverResult};
pub use summary::{AllocationSummary, AssetLine, compose};
pub use types::{AllocationOutcome, AllocationRequest, AssetId, Prices, ShareAllocation, TargetWeights};
pub use validation::validate;
pub use weights::update_weights;
