//! Core allocation types

use crate::error::SolverError;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque identifier of a tradable instrument
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Create a new asset identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AssetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for AssetId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Desired fraction of the budget per asset
pub type TargetWeights = FxHashMap<AssetId, f64>;

/// Current unit price per asset
pub type Prices = FxHashMap<AssetId, f64>;

/// Whole-share count per asset
pub type ShareAllocation = FxHashMap<AssetId, u64>;

/// Which guarantee applies to a set of shares
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AllocationOutcome {
    /// Optimal integer allocation; cost never exceeds the budget
    Exact {
        /// Shares per asset
        shares: ShareAllocation,
    },
    /// Rounded continuous relaxation; cost may exceed the budget
    Approximate {
        /// Shares per asset
        shares: ShareAllocation,
        /// Why the exact solve was not used
        cause: SolverError,
    },
}

impl AllocationOutcome {
    /// Shares regardless of which path produced them
    pub fn shares(&self) -> &ShareAllocation {
        match self {
            Self::Exact { shares } | Self::Approximate { shares, .. } => shares,
        }
    }

    /// Consume the outcome, keeping the shares
    pub fn into_shares(self) -> ShareAllocation {
        match self {
            Self::Exact { shares } | Self::Approximate { shares, .. } => shares,
        }
    }

    /// True when the budget constraint is guaranteed
    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Exact { .. })
    }
}

/// Serialized allocation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRequest {
    /// Cash available
    pub budget: f64,
    /// Target weight per asset
    pub target_weights: TargetWeights,
    /// Unit price per asset
    pub prices: Prices,
}
