//! Tracking-error problem formulation
//!
//! minimize   Σ (x_i * p_i / B - w_i)²
//! subject to Σ x_i * p_i <= B,  x_i >= 0
//!
//! Assets are held in sorted order so every solve sees the same variable
//! layout for the same request.

use crate::types::{AssetId, Prices, TargetWeights};
use nalgebra::DVector;

/// Quadratic tracking problem over a fixed asset order
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingProblem {
    assets: Vec<AssetId>,
    prices: DVector<f64>,
    targets: DVector<f64>,
    budget: f64,
}

impl TrackingProblem {
    /// Build from validated inputs. Callers must have run `validate` first.
    pub fn new(budget: f64, weights: &TargetWeights, prices: &Prices) -> Self {
        let mut assets: Vec<AssetId> = weights.keys().cloned().collect();
        assets.sort();

        let prices = DVector::from_iterator(assets.len(), assets.iter().map(|a| prices[a]));
        let targets = DVector::from_iterator(assets.len(), assets.iter().map(|a| weights[a]));

        Self {
            assets,
            prices,
            targets,
            budget,
        }
    }

    /// Number of decision variables
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// True when there is nothing to allocate
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Asset order of the decision variables
    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    /// Unit prices in variable order
    pub fn prices(&self) -> &DVector<f64> {
        &self.prices
    }

    /// Target weights in variable order
    pub fn targets(&self) -> &DVector<f64> {
        &self.targets
    }

    /// Cash available
    pub fn budget(&self) -> f64 {
        self.budget
    }

    /// Weight bought by one share of each asset (`p_i / B`)
    pub fn share_weights(&self) -> DVector<f64> {
        &self.prices / self.budget
    }

    /// Largest whole-share count of each asset the budget can pay for alone
    pub fn share_caps(&self) -> Vec<u64> {
        self.prices
            .iter()
            .map(|p| {
                let cap = (self.budget / p).floor();
                // SAFETY: cap is finite and non-negative for validated input
                if cap.is_finite() && cap > 0.0 { cap as u64 } else { 0 }
            })
            .collect()
    }

    /// Total cost of a share vector.
    ///
    /// Summed left to right in asset order, the same order the composer uses
    /// for the invested amount, so an affordable vector never reports as
    /// overspent.
    pub fn cost(&self, shares: &DVector<f64>) -> f64 {
        self.prices.iter().zip(shares.iter()).map(|(p, x)| x * p).sum()
    }

    /// Sum of squared weight errors of a share vector
    pub fn objective(&self, shares: &DVector<f64>) -> f64 {
        if self.budget <= 0.0 {
            return self.targets.norm_squared();
        }
        let actual = self.prices.component_mul(shares) / self.budget;
        (actual - &self.targets).norm_squared()
    }

    /// True when the share vector stays within the budget
    pub fn is_affordable(&self, shares: &DVector<f64>) -> bool {
        self.cost(shares) <= self.budget
    }
}
