//! Property tests for the weighting statistics

use proptest::prelude::*;
use survey_core::{design_effect, effective_n, Error};

proptest! {
    // Equal positive weights carry no design effect
    #[test]
    fn prop_equal_weights(weight in 0.01f64..1000.0, n in 1usize..500) {
        let weights = vec![weight; n];
        let n_eff = effective_n(&weights).unwrap();
        let deff = design_effect(&weights).unwrap();
        prop_assert!((n_eff - n as f64).abs() < 1e-6 * n as f64);
        prop_assert!((deff - 1.0).abs() < 1e-9);
    }

    // DEFF = 1 + CV² and DEFF = n / n_eff agree
    #[test]
    fn prop_design_effect_identity(weights in prop::collection::vec(0.05f64..20.0, 1..300)) {
        let n = weights.len() as f64;
        let n_eff = effective_n(&weights).unwrap();
        let deff = design_effect(&weights).unwrap();
        prop_assert!((deff - n / n_eff).abs() < 1e-9 * deff);
    }

    // Kish's n_eff never exceeds n and is at least 1
    #[test]
    fn prop_effective_n_bounds(weights in prop::collection::vec(0.05f64..20.0, 1..300)) {
        let n_eff = effective_n(&weights).unwrap();
        prop_assert!(n_eff <= weights.len() as f64 + 1e-9);
        prop_assert!(n_eff >= 1.0 - 1e-9);
    }
}

#[test]
fn test_all_zero_weights_are_rejected() {
    let err = effective_n(&[0.0, 0.0, 0.0]).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}
