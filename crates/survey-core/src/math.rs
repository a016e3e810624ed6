//! Distribution quantiles used by the interval estimators
//!
//! Thin wrappers around `statrs` that turn construction failures into
//! [`Error::Computation`] and take a two-sided confidence level directly.

use crate::{Error, Result};
use statrs::distribution::{Beta, ContinuousCDF, Normal, StudentsT};

/// Bisection iterations for the beta quantile; 2^-100 is far below f64 resolution
const BETA_BISECTION_ITERATIONS: usize = 100;
const BETA_BISECTION_TOLERANCE: f64 = 1e-14;

fn check_level(confidence_level: f64) -> Result<()> {
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(Error::invalid_confidence_level(confidence_level));
    }
    Ok(())
}

/// Standard normal quantile function
pub fn normal_quantile(p: f64) -> Result<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(Error::InvalidInput(format!(
            "Probability {p} must be in (0, 1)"
        )));
    }
    let normal = Normal::new(0.0, 1.0).map_err(|e| {
        Error::Computation(format!("Failed to create normal distribution: {e}"))
    })?;
    Ok(normal.inverse_cdf(p))
}

/// Two-sided normal critical value, `Φ⁻¹(1 - α/2)`
pub fn z_critical(confidence_level: f64) -> Result<f64> {
    check_level(confidence_level)?;
    let alpha = 1.0 - confidence_level;
    normal_quantile(1.0 - alpha / 2.0)
}

/// Two-sided Student-t critical value with (possibly fractional) `df`
pub fn t_critical(confidence_level: f64, df: f64) -> Result<f64> {
    check_level(confidence_level)?;
    if !(df > 0.0) || !df.is_finite() {
        return Err(Error::InvalidInput(format!(
            "Degrees of freedom {df} must be positive"
        )));
    }
    let t_dist = StudentsT::new(0.0, 1.0, df).map_err(|e| {
        Error::Computation(format!("Failed to create t-distribution: {e}"))
    })?;
    let alpha = 1.0 - confidence_level;
    Ok(t_dist.inverse_cdf(1.0 - alpha / 2.0))
}

/// Quantile of `Beta(alpha, beta)` at probability `p`
///
/// Found by bisection on the regularised incomplete beta CDF, which is
/// monotone on [0, 1].
pub fn beta_quantile(alpha: f64, beta: f64, p: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&p) {
        return Err(Error::InvalidInput(format!(
            "Probability {p} must be in [0, 1]"
        )));
    }
    let dist = Beta::new(alpha, beta).map_err(|e| {
        Error::Computation(format!(
            "Failed to create Beta({alpha}, {beta}) distribution: {e}"
        ))
    })?;
    if p == 0.0 {
        return Ok(0.0);
    }
    if p == 1.0 {
        return Ok(1.0);
    }

    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    for _ in 0..BETA_BISECTION_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        if dist.cdf(mid) < p {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < BETA_BISECTION_TOLERANCE {
            break;
        }
    }
    Ok(0.5 * (lo + hi))
}

/// Empirical quantile of sorted data with linear interpolation between order
/// statistics (Hyndman & Fan type 7)
pub fn empirical_quantile(sorted: &[f64], p: f64) -> Result<f64> {
    if sorted.is_empty() {
        return Err(Error::empty_input("empirical quantile"));
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(Error::InvalidInput(format!(
            "Probability {p} must be in [0, 1]"
        )));
    }
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = h - lo as f64;
    Ok(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}
