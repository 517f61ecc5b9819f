//! Input validation gate run before any solver invocation

use crate::error::{AllocatorError, AllocatorResult};
use crate::types::{AssetId, Prices, TargetWeights};

/// Check budget, weights and prices for an allocation request.
///
/// Weights must each lie in [0, 1] and sum to 1 within `tolerance`; every
/// weighted asset needs a positive price. Prices for unweighted assets are
/// ignored.
pub fn validate(
    budget: f64,
    weights: &TargetWeights,
    prices: &Prices,
    tolerance: f64,
) -> AllocatorResult<()> {
    if !(budget.is_finite() && budget >= 0.0) {
        return Err(AllocatorError::InvalidBudget { budget });
    }

    for (asset, &weight) in weights {
        if !(weight.is_finite() && (0.0..=1.0).contains(&weight)) {
            return Err(AllocatorError::InvalidWeight {
                asset: asset.clone(),
                weight,
            });
        }
    }

    let sum: f64 = weights.values().sum();
    if (sum - 1.0).abs() > tolerance {
        return Err(AllocatorError::InvalidWeights { sum });
    }

    let mut missing: Vec<AssetId> = weights
        .keys()
        .filter(|asset| !prices.contains_key(*asset))
        .cloned()
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(AllocatorError::MissingPrice { missing });
    }

    for asset in weights.keys() {
        let price = prices[asset];
        if !(price.is_finite() && price > 0.0) {
            return Err(AllocatorError::InvalidPrice {
                asset: asset.clone(),
                price,
            });
        }
    }

    Ok(())
}
