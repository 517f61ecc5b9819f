//! Multiplicative weights update tests

use crate::fixtures::asset_map;
use approx::assert_abs_diff_eq;
use discrete_allocator::{AllocatorError, update_weights};
use rstest::*;

const TICKERS: [&str; 5] = ["AMD", "UBS", "USO", "GLD", "SLV"];

#[test]
fn test_reference_update() {
    let current = asset_map(&TICKERS.map(|t| (t, 0.2)));
    let losses = asset_map(&[
        ("AMD", 0.01),
        ("UBS", 0.02),
        ("USO", 0.03),
        ("GLD", 0.04),
        ("SLV", 0.05),
    ]);

    let updated = update_weights(&current, &losses, 0.1).unwrap();

    let expected = [0.200400, 0.200200, 0.199999, 0.199800, 0.199600];
    for (ticker, weight) in TICKERS.iter().zip(expected) {
        assert_abs_diff_eq!(updated[*ticker], weight, epsilon = 1e-5);
    }
    assert_abs_diff_eq!(updated.values().sum::<f64>(), 1.0, epsilon = 1e-12);
}

#[rstest]
#[case(0.0)]
#[case(1.0)]
#[case(25.0)]
fn test_equal_losses_keep_weights(#[case] epsilon: f64) {
    let current = asset_map(&[("A", 0.3), ("B", 0.7)]);
    let losses = asset_map(&[("A", 0.04), ("B", 0.04)]);

    let updated = update_weights(&current, &losses, epsilon).unwrap();
    assert_abs_diff_eq!(updated["A"], 0.3, epsilon = 1e-12);
    assert_abs_diff_eq!(updated["B"], 0.7, epsilon = 1e-12);
}

#[test]
fn test_higher_loss_loses_weight() {
    let current = asset_map(&[("A", 0.5), ("B", 0.5)]);
    let losses = asset_map(&[("A", 0.10), ("B", -0.10)]);

    let updated = update_weights(&current, &losses, 2.0).unwrap();
    assert!(updated["A"] < 0.5);
    assert!(updated["B"] > 0.5);
}

#[test]
fn test_missing_loss_rejected() {
    let current = asset_map(&[("A", 0.5), ("B", 0.5)]);
    let losses = asset_map(&[("A", 0.1)]);

    assert_eq!(
        update_weights(&current, &losses, 0.1),
        Err(AllocatorError::MissingLoss {
            missing: vec!["B".into()]
        })
    );
}

#[test]
fn test_all_zero_weights_cannot_normalize() {
    let current = asset_map(&[("A", 0.0)]);
    let losses = asset_map(&[("A", 0.1)]);
    assert!(matches!(
        update_weights(&current, &losses, 0.1),
        Err(AllocatorError::InvalidWeights { .. })
    ));
}
