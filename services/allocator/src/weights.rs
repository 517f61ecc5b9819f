//! Multiplicative weights update for target weights

use crate::error::{AllocatorError, AllocatorResult};
use crate::types::{AssetId, TargetWeights};
use rustc_hash::FxHashMap;

/// Scale each weight by `exp(-epsilon * loss)` and renormalize to sum 1.
///
/// Every weighted asset needs a loss; extra losses are ignored.
pub fn update_weights(
    current: &TargetWeights,
    losses: &FxHashMap<AssetId, f64>,
    epsilon: f64,
) -> AllocatorResult<TargetWeights> {
    let mut missing: Vec<AssetId> = current
        .keys()
        .filter(|asset| !losses.contains_key(*asset))
        .cloned()
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(AllocatorError::MissingLoss { missing });
    }

    let scaled: TargetWeights = current
        .iter()
        .map(|(asset, weight)| (asset.clone(), weight * (-epsilon * losses[asset]).exp()))
        .collect();

    let total: f64 = scaled.values().sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(AllocatorError::InvalidWeights { sum: total });
    }

    Ok(scaled
        .into_iter()
        .map(|(asset, weight)| (asset, weight / total))
        .collect())
}
