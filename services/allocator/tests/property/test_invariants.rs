//! Property-based tests for allocation invariants
//!
//! - Exact allocations never spend more than the budget
//! - Remaining cash is always budget minus invested amount
//! - Every weighted asset receives a share count
//! - Exact allocations are optimal against brute-force enumeration
//! - Repeated calls are identical

use crate::oracle;
use approx::relative_eq;
use discrete_allocator::{AllocationOutcome, Allocator, AssetId, Prices, TargetWeights};
use proptest::prelude::*;

/// Random positive weights normalized to sum 1
fn arb_weights(n: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.01f64..1.0, n).prop_map(|raw| {
        let total: f64 = raw.iter().sum();
        raw.into_iter().map(|w| w / total).collect::<Vec<f64>>()
    })
}

/// Assets with weights and prices
fn arb_assets(max_assets: usize, price: std::ops::Range<f64>) -> impl Strategy<Value = Vec<(f64, f64)>> {
    (1..=max_assets).prop_flat_map(move |n| {
        (arb_weights(n), prop::collection::vec(price.clone(), n))
            .prop_map(|(weights, prices)| weights.into_iter().zip(prices).collect::<Vec<(f64, f64)>>())
    })
}

fn to_maps(assets: &[(f64, f64)]) -> (TargetWeights, Prices) {
    let ids: Vec<AssetId> = (0..assets.len()).map(|i| AssetId::new(format!("A{i}"))).collect();
    let weights = ids.iter().cloned().zip(assets.iter().map(|(w, _)| *w)).collect();
    let prices = ids.into_iter().zip(assets.iter().map(|(_, p)| *p)).collect();
    (weights, prices)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_exact_allocation_respects_budget(
        assets in arb_assets(5, 1.0..500.0),
        budget in 0.0f64..50_000.0,
    ) {
        let (weights, prices) = to_maps(&assets);
        let allocation = Allocator::default().allocate(budget, &weights, &prices).unwrap();

        prop_assert_eq!(allocation.shares().len(), assets.len());
        prop_assert_eq!(
            allocation.summary.remaining_cash,
            budget - allocation.summary.invested_amount
        );
        if let AllocationOutcome::Exact { shares } = &allocation.outcome {
            let mut held: Vec<(&AssetId, &u64)> = shares.iter().collect();
            held.sort();
            let spent: f64 = held.iter().map(|(asset, n)| **n as f64 * prices[*asset]).sum();
            prop_assert!(spent <= budget, "spent {} of {}", spent, budget);
            prop_assert!(allocation.summary.invested_amount <= budget);
        }
    }

    #[test]
    fn prop_allocation_is_repeatable(
        assets in arb_assets(4, 1.0..300.0),
        budget in 0.0f64..20_000.0,
    ) {
        let (weights, prices) = to_maps(&assets);
        let allocator = Allocator::default();
        let first = allocator.allocate(budget, &weights, &prices).unwrap();
        let second = allocator.allocate(budget, &weights, &prices).unwrap();
        prop_assert_eq!(first, second);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_exact_allocation_is_optimal(
        assets in arb_assets(3, 5.0..200.0),
        budget in 1.0f64..600.0,
    ) {
        let (weights, prices) = to_maps(&assets);
        let allocation = Allocator::default().allocate(budget, &weights, &prices).unwrap();
        prop_assume!(allocation.is_exact());

        let (_, best) = oracle::brute_force(budget, &assets);
        let found = allocation.summary.tracking_error;
        prop_assert!(
            found <= best + 1e-9 || relative_eq!(found, best, max_relative = 1e-9),
            "allocator {} vs enumeration {}", found, best
        );
    }
}
