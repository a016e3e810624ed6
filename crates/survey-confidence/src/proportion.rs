//! Confidence intervals for proportions
//!
//! Four constructions over an observed proportion `p` and a sample size `n`
//! (the effective sample size when design weights are in play):
//!
//! - [`normal_ci`]: classic margin of error, `p ± z·sqrt(p(1-p)/n)`
//! - [`wilson_ci`]: Wilson score interval, well behaved for small `n` or
//!   extreme `p`
//! - [`bootstrap_proportion_ci`]: percentile bootstrap over respondents
//! - [`credible_interval_proportion`]: Beta-Binomial posterior interval

use crate::{
    Bootstrap, ConfidenceInterval, ConfidenceLevel, Diagnostics, IntervalMethod, IntervalResult,
};
use survey_core::{math, Error, ExecutionEngine, Result, SequentialEngine};
use tracing::debug;

/// Below this sample size the normal approximation is flagged
pub const SMALL_SAMPLE_THRESHOLD: f64 = 30.0;

/// Proportions outside `[LOW, HIGH]` are flagged as extreme for the normal approximation
pub const EXTREME_PROPORTION_LOW: f64 = 0.10;
pub const EXTREME_PROPORTION_HIGH: f64 = 0.90;

/// Prior sample size used when only a prior mean is configured
pub const DEFAULT_PRIOR_N: f64 = 100.0;

fn validate_proportion(p: f64, n: f64) -> Result<()> {
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(Error::InvalidInput(format!(
            "Proportion {p} must be a finite value in [0, 1]"
        )));
    }
    if !n.is_finite() || n <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "Sample size {n} must be positive"
        )));
    }
    Ok(())
}

fn success_indicators<T: PartialEq>(values: &[T], success_categories: &[T]) -> Result<Vec<bool>> {
    if success_categories.is_empty() {
        return Err(Error::Configuration(
            "At least one success category is required".to_string(),
        ));
    }
    Ok(values
        .iter()
        .map(|v| success_categories.contains(v))
        .collect())
}

fn indicator_share(indicators: &[bool], weights: Option<&[f64]>, indices: &[usize]) -> f64 {
    match weights {
        None => {
            let hits = indices.iter().filter(|&&i| indicators[i]).count();
            hits as f64 / indices.len() as f64
        }
        Some(w) => {
            let (hit, total) = indices.iter().fold((0.0, 0.0), |(hit, total), &i| {
                (if indicators[i] { hit + w[i] } else { hit }, total + w[i])
            });
            hit / total
        }
    }
}

/// Weighted (or plain) share of `values` falling in `success_categories`
pub fn proportion_estimate<T: PartialEq>(
    values: &[T],
    success_categories: &[T],
    weights: Option<&[f64]>,
) -> Result<f64> {
    if values.is_empty() {
        return Err(Error::empty_input("proportion"));
    }
    if let Some(w) = weights {
        if w.len() != values.len() {
            return Err(Error::size_mismatch(values.len(), w.len(), "weight vector"));
        }
        if w.iter().sum::<f64>() <= 0.0 {
            return Err(Error::InvalidInput("Total weight is zero".to_string()));
        }
    }
    let indicators = success_indicators(values, success_categories)?;
    let all: Vec<usize> = (0..values.len()).collect();
    Ok(indicator_share(&indicators, weights, &all))
}

/// Normal-approximation interval (margin of error)
///
/// Bounds are clamped to [0, 1]. An advisory is attached when `n < 30` or
/// `p` lies outside [0.10, 0.90].
pub fn normal_ci(p: f64, n: f64, confidence_level: f64) -> Result<IntervalResult> {
    validate_proportion(p, n)?;
    let level = ConfidenceLevel::new(confidence_level)?;

    let z = level.z_critical()?;
    let se = (p * (1.0 - p) / n).sqrt();
    let moe = z * se;
    debug!(p, n, se, moe, "normal proportion interval");

    let interval = ConfidenceInterval::new(p - moe, p + moe, p, confidence_level).clamped(0.0, 1.0);
    let mut result = IntervalResult::new(
        IntervalMethod::NormalApproximation,
        interval,
        Diagnostics::Normal {
            standard_error: se,
            critical_value: z,
            sample_size: n,
        },
    );

    if n < SMALL_SAMPLE_THRESHOLD {
        result = result.with_advisory(format!(
            "Sample size {n:.1} is below {SMALL_SAMPLE_THRESHOLD}; \
             normal approximation may be inaccurate, consider Wilson"
        ));
    }
    if !(EXTREME_PROPORTION_LOW..=EXTREME_PROPORTION_HIGH).contains(&p) {
        result = result.with_advisory(format!(
            "Proportion {p:.3} is outside [{EXTREME_PROPORTION_LOW}, {EXTREME_PROPORTION_HIGH}]; \
             normal approximation may be inaccurate, consider Wilson"
        ));
    }
    Ok(result)
}

/// Wilson score interval
///
/// Bounds lie in [0, 1] by construction; they are clamped anyway to absorb
/// rounding at `p = 0` or `p = 1`.
pub fn wilson_ci(p: f64, n: f64, confidence_level: f64) -> Result<IntervalResult> {
    validate_proportion(p, n)?;
    let level = ConfidenceLevel::new(confidence_level)?;

    let z = level.z_critical()?;
    let z2 = z * z;
    let denominator = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denominator;
    let margin = z * ((p * (1.0 - p) + z2 / (4.0 * n)) / n).sqrt() / denominator;

    let interval =
        ConfidenceInterval::new(center - margin, center + margin, p, confidence_level)
            .clamped(0.0, 1.0);
    Ok(IntervalResult::new(
        IntervalMethod::Wilson,
        interval,
        Diagnostics::Wilson {
            center,
            margin,
            critical_value: z,
            sample_size: n,
        },
    ))
}

/// Percentile bootstrap interval for a proportion
///
/// Resamples respondents `n_resamples` times (at least 1000). With `seed` the
/// result is deterministic.
pub fn bootstrap_proportion_ci<T: PartialEq>(
    values: &[T],
    success_categories: &[T],
    weights: Option<&[f64]>,
    n_resamples: usize,
    confidence_level: f64,
    seed: Option<u64>,
) -> Result<IntervalResult> {
    let bootstrap = Bootstrap::new(SequentialEngine)
        .with_resamples(n_resamples)
        .with_confidence_level(confidence_level)
        .with_seed(seed);
    bootstrap_proportion_ci_with(&bootstrap, values, success_categories, weights)
}

/// [`bootstrap_proportion_ci`] on a caller-configured bootstrap engine
pub fn bootstrap_proportion_ci_with<E: ExecutionEngine, T: PartialEq>(
    bootstrap: &Bootstrap<E>,
    values: &[T],
    success_categories: &[T],
    weights: Option<&[f64]>,
) -> Result<IntervalResult> {
    let estimate = proportion_estimate(values, success_categories, weights)?;
    let indicators = success_indicators(values, success_categories)?;

    bootstrap.percentile_interval(values.len(), estimate, |indices| {
        indicator_share(&indicators, weights, indices)
    })
}

/// Beta-Binomial credible interval
///
/// Prior is `Beta(1, 1)` unless `prior_mean` is given, in which case it is
/// `Beta(prior_mean·prior_n, (1-prior_mean)·prior_n)` with `prior_n`
/// defaulting to 100. Successes are `round(p·n)` (ties to even); the reported
/// estimate is the posterior mean.
pub fn credible_interval_proportion(
    p: f64,
    n: f64,
    confidence_level: f64,
    prior_mean: Option<f64>,
    prior_n: Option<f64>,
) -> Result<IntervalResult> {
    validate_proportion(p, n)?;
    let level = ConfidenceLevel::new(confidence_level)?;
    let mut advisories = Vec::new();

    let (alpha0, beta0) = match prior_mean {
        None => {
            if prior_n.is_some() {
                advisories.push("prior_n ignored because no prior_mean was given".to_string());
            }
            (1.0, 1.0)
        }
        Some(mean) => {
            if !(mean > 0.0 && mean < 1.0) {
                return Err(Error::Configuration(format!(
                    "Prior mean {mean} for a proportion must be in (0, 1)"
                )));
            }
            let prior_n = match prior_n {
                Some(pn) if pn.is_finite() && pn > 0.0 => pn,
                Some(pn) => {
                    return Err(Error::Configuration(format!(
                        "Prior sample size {pn} must be positive"
                    )));
                }
                None => {
                    advisories.push(format!(
                        "prior_n not specified; using default prior sample size {DEFAULT_PRIOR_N}"
                    ));
                    DEFAULT_PRIOR_N
                }
            };
            (mean * prior_n, (1.0 - mean) * prior_n)
        }
    };

    let successes = (p * n).round_ties_even();
    let alpha1 = alpha0 + successes;
    let beta1 = beta0 + (n - successes).max(0.0);
    let posterior_mean = alpha1 / (alpha1 + beta1);

    let lower = math::beta_quantile(alpha1, beta1, level.tail_probability())?;
    let upper = math::beta_quantile(alpha1, beta1, 1.0 - level.tail_probability())?;
    debug!(alpha1, beta1, posterior_mean, "beta posterior");

    let mut result = IntervalResult::new(
        IntervalMethod::CredibleBeta,
        ConfidenceInterval::new(lower, upper, posterior_mean, confidence_level).clamped(0.0, 1.0),
        Diagnostics::BetaPosterior {
            prior_alpha: alpha0,
            prior_beta: beta0,
            posterior_alpha: alpha1,
            posterior_beta: beta1,
        },
    );
    result.advisories = advisories;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normal_ci_reference_values() {
        let result = normal_ci(0.45, 1000.0, 0.95).unwrap();
        assert_relative_eq!(result.margin_of_error(), 0.030835, epsilon = 1e-5);
        assert_relative_eq!(result.lower(), 0.419165, epsilon = 1e-5);
        assert_relative_eq!(result.upper(), 0.480835, epsilon = 1e-5);
        assert!(result.advisories.is_empty());
    }

    #[test]
    fn test_normal_ci_advisories() {
        let small = normal_ci(0.5, 20.0, 0.95).unwrap();
        assert_eq!(small.advisories.len(), 1);
        assert!(small.advisories[0].contains("below 30"));

        let extreme = normal_ci(0.03, 20.0, 0.95).unwrap();
        assert_eq!(extreme.advisories.len(), 2);
    }

    #[test]
    fn test_normal_ci_clamps_at_zero() {
        let result = normal_ci(0.01, 50.0, 0.95).unwrap();
        assert_eq!(result.lower(), 0.0);
        assert!(result.upper() > 0.01);
    }

    #[test]
    fn test_wilson_ci_small_proportion() {
        let wilson = wilson_ci(0.05, 200.0, 0.95).unwrap();
        let normal = normal_ci(0.05, 200.0, 0.95).unwrap();

        assert!(wilson.lower() > 0.0);
        assert!(wilson.lower() > normal.lower());
        assert_relative_eq!(wilson.lower(), 0.027383, epsilon = 1e-5);
        assert_relative_eq!(wilson.upper(), 0.089578, epsilon = 1e-5);
        assert_eq!(wilson.estimate(), 0.05);
    }

    #[test]
    fn test_wilson_positive_where_normal_clamps() {
        let normal = normal_ci(0.01, 50.0, 0.95).unwrap();
        let wilson = wilson_ci(0.01, 50.0, 0.95).unwrap();
        assert_eq!(normal.lower(), 0.0);
        assert!(wilson.lower() > 0.0);
    }

    #[test]
    fn test_wilson_ci_boundaries() {
        let zero = wilson_ci(0.0, 40.0, 0.95).unwrap();
        assert_eq!(zero.lower(), 0.0);
        assert!(zero.upper() > 0.0 && zero.upper() < 0.15);

        let one = wilson_ci(1.0, 40.0, 0.95).unwrap();
        assert_eq!(one.upper(), 1.0);
        assert!(one.lower() > 0.85);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(normal_ci(f64::NAN, 10.0, 0.95), Err(Error::InvalidInput(_))));
        assert!(matches!(normal_ci(0.5, -1.0, 0.95), Err(Error::InvalidInput(_))));
        assert!(matches!(wilson_ci(1.2, 10.0, 0.95), Err(Error::InvalidInput(_))));
        assert!(matches!(wilson_ci(0.5, 10.0, 1.0), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_proportion_estimate() {
        let values = [1, 2, 2, 3, 1];
        assert_relative_eq!(proportion_estimate(&values, &[1], None).unwrap(), 0.4);
        assert_relative_eq!(proportion_estimate(&values, &[1, 2], None).unwrap(), 0.8);

        let weights = [3.0, 1.0, 1.0, 1.0, 0.0];
        assert_relative_eq!(
            proportion_estimate(&values, &[1], Some(&weights[..])).unwrap(),
            0.5
        );
        assert!(matches!(
            proportion_estimate(&values, &[], None),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_bootstrap_proportion_ci() {
        let values: Vec<u8> = (0..400).map(|i| if i % 4 == 0 { 1 } else { 0 }).collect();
        let result = bootstrap_proportion_ci(&values, &[1], None, 2000, 0.95, Some(17)).unwrap();

        assert_eq!(result.method, IntervalMethod::Bootstrap);
        assert_relative_eq!(result.estimate(), 0.25);
        assert!(result.lower() < 0.25 && result.upper() > 0.25);
        assert!(result.lower() >= 0.0 && result.upper() <= 1.0);
        // Bootstrap width should be close to the analytic one
        let normal = normal_ci(0.25, 400.0, 0.95).unwrap();
        assert!((result.width() - normal.width()).abs() < 0.02);
    }

    #[test]
    fn test_bootstrap_proportion_rejects_few_resamples() {
        let values = [1, 0, 1, 1];
        assert!(matches!(
            bootstrap_proportion_ci(&values, &[1], None, 500, 0.95, Some(1)),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_credible_uninformed_posterior_mean() {
        let result = credible_interval_proportion(0.3, 50.0, 0.95, None, None).unwrap();
        // (15 + 1) / (50 + 2)
        assert_relative_eq!(result.estimate(), 16.0 / 52.0, epsilon = 1e-12);
        assert!(result.lower() < result.estimate() && result.estimate() < result.upper());
        assert!(result.advisories.is_empty());
    }

    #[test]
    fn test_credible_informed_prior() {
        let result =
            credible_interval_proportion(0.5, 100.0, 0.95, Some(0.65), Some(50.0)).unwrap();
        match result.diagnostics {
            Diagnostics::BetaPosterior {
                prior_alpha,
                prior_beta,
                posterior_alpha,
                posterior_beta,
            } => {
                assert_relative_eq!(prior_alpha, 32.5, epsilon = 1e-12);
                assert_relative_eq!(prior_beta, 17.5, epsilon = 1e-12);
                assert_relative_eq!(posterior_alpha, 82.5, epsilon = 1e-12);
                assert_relative_eq!(posterior_beta, 67.5, epsilon = 1e-12);
            }
            ref other => panic!("Unexpected diagnostics: {other:?}"),
        }
        assert_relative_eq!(result.estimate(), 82.5 / 150.0, epsilon = 1e-12);
    }

    #[test]
    fn test_credible_default_prior_n_advisory() {
        let result = credible_interval_proportion(0.5, 100.0, 0.95, Some(0.6), None).unwrap();
        assert_eq!(result.advisories.len(), 1);
        assert!(result.advisories[0].contains("100"));
    }

    #[test]
    fn test_credible_invalid_prior() {
        assert!(matches!(
            credible_interval_proportion(0.5, 100.0, 0.95, Some(1.2), Some(10.0)),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            credible_interval_proportion(0.5, 100.0, 0.95, Some(0.5), Some(0.0)),
            Err(Error::Configuration(_))
        ));
    }
}
