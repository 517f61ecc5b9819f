//! Result composition and text report

use crate::types::{AssetId, Prices, ShareAllocation, TargetWeights};
use serde::Serialize;
use std::fmt;

/// Per-asset line of an allocation summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetLine {
    pub asset: AssetId,
    pub price: f64,
    pub target_weight: f64,
    pub shares: u64,
    /// `shares * price`
    pub cost: f64,
    /// `cost / budget`, 0 when the budget is 0
    pub actual_weight: f64,
    /// `actual_weight - target_weight`
    pub weight_error: f64,
}

/// Money and weight figures of an allocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationSummary {
    pub budget: f64,
    pub invested_amount: f64,
    /// `budget - invested_amount`; negative when a rounded fallback overshoots
    pub remaining_cash: f64,
    /// Sorted by asset
    pub lines: Vec<AssetLine>,
    /// Sum of squared weight errors
    pub tracking_error: f64,
}

impl AllocationSummary {
    /// Line for one asset
    pub fn line(&self, asset: &str) -> Option<&AssetLine> {
        self.lines.iter().find(|line| line.asset.as_str() == asset)
    }

    /// True when the invested amount exceeds the budget
    pub fn overshoots_budget(&self) -> bool {
        self.invested_amount > self.budget
    }
}

/// Compute invested amount, remaining cash and per-asset weights.
///
/// Every weighted asset gets a line; an asset missing from `shares` counts as
/// zero shares.
pub fn compose(
    shares: &ShareAllocation,
    weights: &TargetWeights,
    prices: &Prices,
    budget: f64,
) -> AllocationSummary {
    let mut assets: Vec<&AssetId> = weights.keys().collect();
    assets.sort();

    let lines: Vec<AssetLine> = assets
        .into_iter()
        .map(|asset| {
            let price = prices.get(asset).copied().unwrap_or(0.0);
            let count = shares.get(asset).copied().unwrap_or(0);
            // SAFETY: share counts are far below 2^53
            let cost = count as f64 * price;
            let actual_weight = if budget > 0.0 { cost / budget } else { 0.0 };
            let target_weight = weights[asset];
            AssetLine {
                asset: asset.clone(),
                price,
                target_weight,
                shares: count,
                cost,
                actual_weight,
                weight_error: actual_weight - target_weight,
            }
        })
        .collect();

    let invested_amount: f64 = lines.iter().map(|line| line.cost).sum();
    let tracking_error = lines.iter().map(|line| line.weight_error.powi(2)).sum();

    AllocationSummary {
        budget,
        invested_amount,
        remaining_cash: budget - invested_amount,
        lines,
        tracking_error,
    }
}

const RULE_WIDTH: usize = 80;

impl fmt::Display for AllocationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);

        writeln!(f, "{heavy}")?;
        writeln!(f, "PORTFOLIO ALLOCATION RESULTS")?;
        writeln!(f, "{heavy}")?;
        writeln!(f, "Total Available Amount: ${:.2}", self.budget)?;
        writeln!(f, "Total Invested:         ${:.2}", self.invested_amount)?;
        writeln!(f, "Remaining Cash:         ${:.2}", self.remaining_cash)?;
        writeln!(f, "{light}")?;
        writeln!(
            f,
            "{:<10} {:>12} {:>10} {:>10} {:>14} {:>10}",
            "Asset", "Price", "Target %", "Shares", "Cost", "Actual %"
        )?;
        writeln!(f, "{light}")?;
        for line in &self.lines {
            writeln!(
                f,
                "{:<10} {:>12.2} {:>9.2}% {:>10} {:>14.2} {:>9.2}%",
                line.asset.as_str(),
                line.price,
                line.target_weight * 100.0,
                line.shares,
                line.cost,
                line.actual_weight * 100.0
            )?;
        }
        writeln!(f, "{light}")?;
        writeln!(f, "Weight Errors:")?;
        for line in &self.lines {
            writeln!(
                f,
                "  {}: Target={:.4}, Actual={:.4}, Error={:.4}",
                line.asset, line.target_weight, line.actual_weight, line.weight_error
            )?;
        }
        writeln!(f, "Sum of Squared Errors: {:.8}", self.tracking_error)?;
        write!(f, "{heavy}")
    }
}
