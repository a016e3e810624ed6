//! Net Promoter Score estimation
//!
//! NPS is `%promoters - %detractors` on a [-100, 100] scale. Every interval is
//! clamped to that range.

use crate::mean::{conjugate_normal, normal_posterior_interval, prior_weight, require_two};
use crate::{
    Bootstrap, ConfidenceInterval, ConfidenceLevel, Diagnostics, IntervalMethod, IntervalResult,
};
use serde::Serialize;
use survey_core::{Error, ExecutionEngine, Result, SequentialEngine};
use tracing::debug;

/// Prior mean used by [`nps_credible_ci`] when none is configured
pub const DEFAULT_PRIOR_MEAN: f64 = 0.0;

/// Prior standard deviation used by [`nps_credible_ci`] when none is configured
pub const DEFAULT_PRIOR_SD: f64 = 50.0;

const NPS_MIN: f64 = -100.0;
const NPS_MAX: f64 = 100.0;

/// NPS point estimate; percentages are on the 0-100 scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NpsStats {
    pub nps_score: f64,
    pub pct_promoters: f64,
    pub pct_detractors: f64,
    pub pct_passives: f64,
    /// Respondents contributing to the estimate
    pub n: usize,
    pub total_weight: f64,
    pub weighted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NpsClass {
    Promoter,
    Detractor,
    Passive,
}

fn classify(
    values: &[f64],
    promoter_codes: &[f64],
    detractor_codes: &[f64],
) -> Result<Vec<NpsClass>> {
    if promoter_codes.is_empty() || detractor_codes.is_empty() {
        return Err(Error::Configuration(
            "NPS requires non-empty promoter and detractor code sets".to_string(),
        ));
    }
    if let Some(code) = promoter_codes.iter().find(|c| detractor_codes.contains(c)) {
        return Err(Error::Configuration(format!(
            "Code {code} is listed as both promoter and detractor"
        )));
    }
    Ok(values
        .iter()
        .map(|v| {
            if promoter_codes.contains(v) {
                NpsClass::Promoter
            } else if detractor_codes.contains(v) {
                NpsClass::Detractor
            } else {
                NpsClass::Passive
            }
        })
        .collect())
}

/// Promoter and detractor shares (as fractions) over the given respondents
fn shares(
    classes: &[NpsClass],
    weights: Option<&[f64]>,
    indices: impl Iterator<Item = usize>,
) -> (f64, f64, f64) {
    let (mut promoters, mut detractors, mut total) = (0.0, 0.0, 0.0);
    for i in indices {
        let w = weights.map_or(1.0, |w| w[i]);
        match classes[i] {
            NpsClass::Promoter => promoters += w,
            NpsClass::Detractor => detractors += w,
            NpsClass::Passive => {}
        }
        total += w;
    }
    (promoters / total, detractors / total, total)
}

/// Promoter, detractor and passive percentages and the resulting score
///
/// # Errors
/// `Configuration` if either code set is empty or the sets overlap.
pub fn nps_point_estimate(
    values: &[f64],
    promoter_codes: &[f64],
    detractor_codes: &[f64],
    weights: Option<&[f64]>,
) -> Result<NpsStats> {
    let classes = classify(values, promoter_codes, detractor_codes)?;
    if values.is_empty() {
        return Err(Error::empty_input("NPS"));
    }
    if let Some(w) = weights {
        if w.len() != values.len() {
            return Err(Error::size_mismatch(values.len(), w.len(), "weight vector"));
        }
    }

    let (p_prom, p_detr, total_weight) = shares(&classes, weights, 0..values.len());
    if !(total_weight > 0.0) {
        return Err(Error::InvalidInput("Total weight is zero".to_string()));
    }
    let pct_promoters = p_prom * 100.0;
    let pct_detractors = p_detr * 100.0;

    Ok(NpsStats {
        nps_score: pct_promoters - pct_detractors,
        pct_promoters,
        pct_detractors,
        pct_passives: (100.0 - pct_promoters - pct_detractors).max(0.0),
        n: values.len(),
        total_weight,
        weighted: weights.is_some(),
    })
}

/// Standard error of the NPS (0-100 scale), treating promoter and detractor
/// shares as independent binomials
fn nps_standard_error(stats: &NpsStats, n_eff: f64) -> f64 {
    let p_prom = stats.pct_promoters / 100.0;
    let p_detr = stats.pct_detractors / 100.0;
    let variance = p_prom * (1.0 - p_prom) / n_eff + p_detr * (1.0 - p_detr) / n_eff;
    variance.sqrt() * 100.0
}

fn validate_n(n_eff: f64) -> Result<()> {
    if !n_eff.is_finite() || n_eff <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "Effective sample size {n_eff} must be positive"
        )));
    }
    Ok(())
}

/// Normal-approximation interval for the NPS
pub fn nps_normal_ci(
    stats: &NpsStats,
    n_eff: f64,
    confidence_level: f64,
) -> Result<IntervalResult> {
    validate_n(n_eff)?;
    let level = ConfidenceLevel::new(confidence_level)?;
    let z = level.z_critical()?;
    let se = nps_standard_error(stats, n_eff);
    let moe = z * se;
    debug!(nps = stats.nps_score, se, moe, "NPS normal interval");

    Ok(IntervalResult::new(
        IntervalMethod::NormalApproximation,
        ConfidenceInterval::new(
            stats.nps_score - moe,
            stats.nps_score + moe,
            stats.nps_score,
            confidence_level,
        )
        .clamped(NPS_MIN, NPS_MAX),
        Diagnostics::Normal {
            standard_error: se,
            critical_value: z,
            sample_size: n_eff,
        },
    ))
}

/// Percentile bootstrap interval for the NPS
pub fn nps_bootstrap_ci(
    values: &[f64],
    promoter_codes: &[f64],
    detractor_codes: &[f64],
    weights: Option<&[f64]>,
    n_resamples: usize,
    confidence_level: f64,
    seed: Option<u64>,
) -> Result<IntervalResult> {
    let bootstrap = Bootstrap::new(SequentialEngine)
        .with_resamples(n_resamples)
        .with_confidence_level(confidence_level)
        .with_seed(seed);
    nps_bootstrap_ci_with(&bootstrap, values, promoter_codes, detractor_codes, weights)
}

/// [`nps_bootstrap_ci`] on a caller-configured bootstrap engine
pub fn nps_bootstrap_ci_with<E: ExecutionEngine>(
    bootstrap: &Bootstrap<E>,
    values: &[f64],
    promoter_codes: &[f64],
    detractor_codes: &[f64],
    weights: Option<&[f64]>,
) -> Result<IntervalResult> {
    let stats = nps_point_estimate(values, promoter_codes, detractor_codes, weights)?;
    let classes = classify(values, promoter_codes, detractor_codes)?;

    let mut result = bootstrap.percentile_interval(values.len(), stats.nps_score, |indices| {
        let (p_prom, p_detr, _) = shares(&classes, weights, indices.iter().copied());
        (p_prom - p_detr) * 100.0
    })?;
    result.interval = result.interval.clamped(NPS_MIN, NPS_MAX);
    Ok(result)
}

/// Normal-Normal credible interval on the NPS scale
///
/// The data term is the NPS with the normal-approximation standard error.
/// Prior mean and standard deviation default to 0 and 50.
///
/// # Errors
/// `InsufficientData` when fewer than two respondents contributed to `stats`.
pub fn nps_credible_ci(
    stats: &NpsStats,
    n_eff: f64,
    confidence_level: f64,
    prior_mean: Option<f64>,
    prior_sd: Option<f64>,
    prior_n: Option<f64>,
) -> Result<IntervalResult> {
    require_two(stats.n)?;
    validate_n(n_eff)?;
    let level = ConfidenceLevel::new(confidence_level)?;

    let mu0 = prior_mean.unwrap_or(DEFAULT_PRIOR_MEAN);
    if !(NPS_MIN..=NPS_MAX).contains(&mu0) {
        return Err(Error::Configuration(format!(
            "Prior mean {mu0} for NPS must be in [-100, 100]"
        )));
    }
    let sd0 = prior_sd.unwrap_or(DEFAULT_PRIOR_SD);
    if !(sd0.is_finite() && sd0 > 0.0) {
        return Err(Error::Configuration(format!(
            "Prior standard deviation {sd0} must be positive"
        )));
    }
    let n0 = prior_weight(prior_n)?;

    let mut advisories = Vec::new();
    let se = nps_standard_error(stats, n_eff);
    let (posterior_mean, posterior_sd) =
        conjugate_normal(stats.nps_score, se, mu0, sd0, n0, &mut advisories);

    let mut result = normal_posterior_interval(
        posterior_mean,
        posterior_sd,
        level,
        Some(mu0),
        Some(sd0),
        advisories,
    )?;
    result.interval = result.interval.clamped(NPS_MIN, NPS_MAX);
    Ok(result)
}
