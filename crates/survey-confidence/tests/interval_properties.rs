//! Properties shared by the interval estimators

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use survey_confidence::{
    bootstrap_mean_ci, bootstrap_proportion_ci, credible_interval_proportion, normal_ci,
    nps_bootstrap_ci, t_ci, wilson_ci,
};

proptest! {
    #[test]
    fn prop_wilson_bounds_in_unit_interval(
        p in 0.0f64..=1.0,
        n in 1.0f64..5000.0,
        conf in 0.5f64..0.999,
    ) {
        let ci = wilson_ci(p, n, conf).unwrap();
        prop_assert!(ci.lower() >= 0.0);
        prop_assert!(ci.upper() <= 1.0);
        prop_assert!(ci.lower() <= ci.upper());
    }

    #[test]
    fn prop_normal_ci_contains_estimate(p in 0.0f64..=1.0, n in 1.0f64..5000.0) {
        let ci = normal_ci(p, n, 0.95).unwrap();
        prop_assert!(ci.lower() <= p && p <= ci.upper());
        prop_assert!(ci.lower() >= 0.0 && ci.upper() <= 1.0);
    }

    #[test]
    fn prop_uninformed_beta_posterior_mean(p in 0.0f64..=1.0, n in 1u32..2000) {
        let n = f64::from(n);
        let ci = credible_interval_proportion(p, n, 0.95, None, None).unwrap();
        let successes = (p * n).round_ties_even();
        prop_assert!((ci.estimate() - (successes + 1.0) / (n + 2.0)).abs() < 1e-12);
        prop_assert!(ci.lower() <= ci.estimate() && ci.estimate() <= ci.upper());
    }
}

#[test]
fn test_strong_prior_dominates() {
    let mut previous_gap = f64::INFINITY;
    for prior_n in [10.0, 1e3, 1e4, 1e6] {
        let ci = credible_interval_proportion(0.2, 100.0, 0.95, Some(0.7), Some(prior_n)).unwrap();
        let gap = (ci.estimate() - 0.7).abs();
        assert!(gap < previous_gap);
        previous_gap = gap;
    }
    assert!(previous_gap < 1e-4);
}

#[test]
fn test_bootstrap_width_does_not_grow_with_resamples() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let normal = Normal::new(50.0, 10.0).unwrap();
    let values: Vec<f64> = (0..150).map(|_| normal.sample(&mut rng)).collect();

    let coarse = bootstrap_mean_ci(&values, None, 1000, 0.95, Some(11)).unwrap();
    let fine = bootstrap_mean_ci(&values, None, 10_000, 0.95, Some(11)).unwrap();
    let analytic = t_ci(&values, None, 0.95).unwrap();

    assert!(fine.width() <= coarse.width() * 1.15);
    assert!((fine.width() - analytic.width()).abs() / analytic.width() < 0.1);
}

#[test]
fn test_estimators_are_idempotent() {
    let responses: Vec<u8> = (0..250).map(|i| (i % 5) as u8).collect();
    let first = bootstrap_proportion_ci(&responses, &[3, 4], None, 1500, 0.9, Some(8)).unwrap();
    let second = bootstrap_proportion_ci(&responses, &[3, 4], None, 1500, 0.9, Some(8)).unwrap();
    assert_eq!(first, second);

    let scores: Vec<f64> = (0..250).map(|i| f64::from(i % 11)).collect();
    let (promoters, detractors) = ([9.0, 10.0], [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let a = nps_bootstrap_ci(&scores, &promoters, &detractors, None, 1000, 0.95, Some(4)).unwrap();
    let b = nps_bootstrap_ci(&scores, &promoters, &detractors, None, 1000, 0.95, Some(4)).unwrap();
    assert_eq!(a, b);

    assert_eq!(wilson_ci(0.3, 80.0, 0.95).unwrap(), wilson_ci(0.3, 80.0, 0.95).unwrap());
}

#[test]
fn test_weighted_bootstrap_proportion() {
    let responses = ["yes", "no", "yes", "maybe", "no", "yes", "no", "no"];
    let weights = [1.5, 0.5, 1.0, 1.0, 2.0, 0.5, 1.0, 0.5];
    let ci = bootstrap_proportion_ci(
        &responses,
        &["yes"],
        Some(&weights[..]),
        2000,
        0.95,
        Some(21),
    )
    .unwrap();
    assert!((ci.estimate() - 3.0 / 8.0).abs() < 1e-12);
    assert!(ci.lower() >= 0.0 && ci.upper() <= 1.0);
}
