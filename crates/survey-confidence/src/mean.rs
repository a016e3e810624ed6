//! Confidence intervals for means of numeric responses
//!
//! All three constructions take the sample size from the Kish effective `n`
//! when weights are supplied. The `_with_n` variants let the caller override
//! it (an assumed design effect, or weighting with effective `n` switched off).

use crate::{
    Bootstrap, ConfidenceInterval, ConfidenceLevel, Diagnostics, IntervalMethod, IntervalResult,
};
use survey_core::{effective_n, moments, Error, ExecutionEngine, Moments, Result, SequentialEngine};
use tracing::debug;

/// Point estimate for a numeric question
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanEstimate {
    pub mean: f64,
    pub sd: f64,
    pub n: usize,
    pub n_eff: f64,
    pub total_weight: f64,
}

/// Mean, standard deviation and effective sample size of `values`
pub fn mean_estimate(values: &[f64], weights: Option<&[f64]>) -> Result<MeanEstimate> {
    let m = moments(values, weights)?;
    let n_eff = match weights {
        Some(w) => effective_n(w)?,
        None => m.n as f64,
    };
    Ok(MeanEstimate {
        mean: m.mean,
        sd: m.sd(),
        n: m.n,
        n_eff,
        total_weight: m.total_weight,
    })
}

fn default_n(values: &[f64], weights: Option<&[f64]>) -> Result<f64> {
    match weights {
        Some(w) => effective_n(w),
        None => Ok(values.len() as f64),
    }
}

/// A standard deviation needs at least two observations
pub(crate) fn require_two(n: usize) -> Result<()> {
    if n < 2 {
        return Err(Error::InsufficientData {
            expected: 2,
            actual: n,
        });
    }
    Ok(())
}

fn validate_n(n_eff: f64) -> Result<()> {
    if !n_eff.is_finite() || n_eff <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "Effective sample size {n_eff} must be positive"
        )));
    }
    Ok(())
}

/// Student-t interval for the (weighted) mean
///
/// # Errors
/// `InsufficientData` with fewer than two values.
pub fn t_ci(
    values: &[f64],
    weights: Option<&[f64]>,
    confidence_level: f64,
) -> Result<IntervalResult> {
    require_two(values.len())?;
    let n_eff = default_n(values, weights)?;
    t_ci_with_n(values, weights, n_eff, confidence_level)
}

/// [`t_ci`] with an explicit effective sample size
pub fn t_ci_with_n(
    values: &[f64],
    weights: Option<&[f64]>,
    n_eff: f64,
    confidence_level: f64,
) -> Result<IntervalResult> {
    require_two(values.len())?;
    validate_n(n_eff)?;
    let level = ConfidenceLevel::new(confidence_level)?;

    let df = n_eff - 1.0;
    if df <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "Effective sample size {n_eff:.3} leaves no degrees of freedom"
        )));
    }

    let Moments { mean, variance, .. } = moments(values, weights)?;
    let sd = variance.sqrt();
    let se = sd / n_eff.sqrt();
    let t = level.t_critical(df)?;
    debug!(mean, sd, se, df, t, "student-t interval");

    Ok(IntervalResult::new(
        IntervalMethod::StudentT,
        ConfidenceInterval::new(mean - t * se, mean + t * se, mean, confidence_level),
        Diagnostics::StudentT {
            standard_error: se,
            standard_deviation: sd,
            degrees_of_freedom: df,
            critical_value: t,
        },
    ))
}

/// Percentile bootstrap interval for the (weighted) mean
pub fn bootstrap_mean_ci(
    values: &[f64],
    weights: Option<&[f64]>,
    n_resamples: usize,
    confidence_level: f64,
    seed: Option<u64>,
) -> Result<IntervalResult> {
    let bootstrap = Bootstrap::new(SequentialEngine)
        .with_resamples(n_resamples)
        .with_confidence_level(confidence_level)
        .with_seed(seed);
    bootstrap_mean_ci_with(&bootstrap, values, weights)
}

/// [`bootstrap_mean_ci`] on a caller-configured bootstrap engine
pub fn bootstrap_mean_ci_with<E: ExecutionEngine>(
    bootstrap: &Bootstrap<E>,
    values: &[f64],
    weights: Option<&[f64]>,
) -> Result<IntervalResult> {
    let estimate = survey_core::weighted_mean(values, weights)?;

    bootstrap.percentile_interval(values.len(), estimate, |indices| match weights {
        None => indices.iter().map(|&i| values[i]).sum::<f64>() / indices.len() as f64,
        Some(w) => {
            let (sum, total) = indices
                .iter()
                .fold((0.0, 0.0), |(sum, total), &i| (sum + values[i] * w[i], total + w[i]));
            sum / total
        }
    })
}

/// Normal-Normal credible interval for the mean
///
/// Without `prior_mean` the posterior is the data mean with standard error
/// `sd/sqrt(n_eff)`. With an informed prior the update is on precision:
/// `τ_data = n_eff/σ²`, `τ_prior = prior_n/prior_sd²` (`prior_n` defaults to 1,
/// so `prior_sd` is then the prior uncertainty of the mean itself).
///
/// # Errors
/// `InsufficientData` with fewer than two values; `Configuration` when
/// `prior_mean` is given without a positive `prior_sd`.
pub fn credible_interval_mean(
    values: &[f64],
    weights: Option<&[f64]>,
    confidence_level: f64,
    prior_mean: Option<f64>,
    prior_sd: Option<f64>,
    prior_n: Option<f64>,
) -> Result<IntervalResult> {
    let n_eff = default_n(values, weights)?;
    credible_interval_mean_with_n(
        values,
        weights,
        n_eff,
        confidence_level,
        prior_mean,
        prior_sd,
        prior_n,
    )
}

/// [`credible_interval_mean`] with an explicit effective sample size
pub fn credible_interval_mean_with_n(
    values: &[f64],
    weights: Option<&[f64]>,
    n_eff: f64,
    confidence_level: f64,
    prior_mean: Option<f64>,
    prior_sd: Option<f64>,
    prior_n: Option<f64>,
) -> Result<IntervalResult> {
    require_two(values.len())?;
    validate_n(n_eff)?;
    let level = ConfidenceLevel::new(confidence_level)?;
    let m = moments(values, weights)?;
    let data_se = m.sd() / n_eff.sqrt();

    let mut advisories = Vec::new();
    let (posterior_mean, posterior_sd) = match prior_mean {
        None => {
            if prior_sd.is_some() || prior_n.is_some() {
                advisories
                    .push("prior_sd/prior_n ignored because no prior_mean was given".to_string());
            }
            (m.mean, data_se)
        }
        Some(mu0) => {
            let sd0 = match prior_sd {
                Some(sd) if sd.is_finite() && sd > 0.0 => sd,
                Some(sd) => {
                    return Err(Error::Configuration(format!(
                        "Prior standard deviation {sd} must be positive"
                    )));
                }
                None => {
                    return Err(Error::Configuration(
                        "prior_sd is required when prior_mean is specified".to_string(),
                    ));
                }
            };
            let n0 = prior_weight(prior_n)?;
            conjugate_normal(m.mean, data_se, mu0, sd0, n0, &mut advisories)
        }
    };

    normal_posterior_interval(
        posterior_mean,
        posterior_sd,
        level,
        prior_mean,
        prior_sd,
        advisories,
    )
}

/// Validated prior sample size, 1 when unspecified
pub(crate) fn prior_weight(prior_n: Option<f64>) -> Result<f64> {
    match prior_n {
        None => Ok(1.0),
        Some(n0) if n0.is_finite() && n0 > 0.0 => Ok(n0),
        Some(n0) => Err(Error::Configuration(format!(
            "Prior sample size {n0} must be positive"
        ))),
    }
}

/// Precision-weighted combination of a data estimate and a normal prior
///
/// A zero data standard error makes the data a point mass, which dominates
/// any finite prior.
pub(crate) fn conjugate_normal(
    data_mean: f64,
    data_se: f64,
    prior_mean: f64,
    prior_sd: f64,
    prior_n: f64,
    advisories: &mut Vec<String>,
) -> (f64, f64) {
    if data_se <= 0.0 {
        advisories
            .push("Data have zero variance; posterior collapses to the observed value".to_string());
        return (data_mean, 0.0);
    }
    let tau_data = 1.0 / (data_se * data_se);
    let tau_prior = prior_n / (prior_sd * prior_sd);
    let tau_post = tau_data + tau_prior;
    let mean = (tau_data * data_mean + tau_prior * prior_mean) / tau_post;
    debug!(tau_data, tau_prior, mean, "normal posterior");
    (mean, tau_post.sqrt().recip())
}

pub(crate) fn normal_posterior_interval(
    posterior_mean: f64,
    posterior_sd: f64,
    level: ConfidenceLevel,
    prior_mean: Option<f64>,
    prior_sd: Option<f64>,
    advisories: Vec<String>,
) -> Result<IntervalResult> {
    let z = level.z_critical()?;
    let mut result = IntervalResult::new(
        IntervalMethod::CredibleNormal,
        ConfidenceInterval::new(
            posterior_mean - z * posterior_sd,
            posterior_mean + z * posterior_sd,
            posterior_mean,
            level.value(),
        ),
        Diagnostics::NormalPosterior {
            prior_mean,
            prior_sd,
            posterior_mean,
            posterior_sd,
        },
    );
    result.advisories = advisories;
    Ok(result)
}
