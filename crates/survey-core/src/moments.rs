//! Weighted and unweighted sample moments
//!
//! Unweighted variance uses Bessel's correction (`n - 1`). Weighted variance is
//! population-style, `Σw(x-μ)² / Σw`, matching how design-weighted survey
//! means are reported.

use crate::{Error, Result};

/// First two moments of a (possibly weighted) sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    /// Sample mean
    pub mean: f64,
    /// Sample variance (see module docs for the estimator used)
    pub variance: f64,
    /// Number of observations
    pub n: usize,
    /// Sum of weights (`n` when unweighted)
    pub total_weight: f64,
    /// Whether design weights were applied
    pub weighted: bool,
}

impl Moments {
    /// Standard deviation
    pub fn sd(&self) -> f64 {
        self.variance.sqrt()
    }
}

pub(crate) fn check_weights(values: &[f64], weights: Option<&[f64]>) -> Result<()> {
    if let Some(w) = weights {
        if w.len() != values.len() {
            return Err(Error::size_mismatch(values.len(), w.len(), "weight vector"));
        }
        if w.iter().any(|x| !x.is_finite()) {
            return Err(Error::non_finite("weights"));
        }
        if w.iter().any(|&x| x < 0.0) {
            return Err(Error::InvalidInput("Weights must be non-negative".to_string()));
        }
    }
    Ok(())
}

/// Weighted (or plain) mean
pub fn weighted_mean(values: &[f64], weights: Option<&[f64]>) -> Result<f64> {
    if values.is_empty() {
        return Err(Error::empty_input("mean"));
    }
    if values.iter().any(|x| !x.is_finite()) {
        return Err(Error::non_finite("values"));
    }
    check_weights(values, weights)?;

    match weights {
        None => Ok(values.iter().sum::<f64>() / values.len() as f64),
        Some(w) => {
            let total: f64 = w.iter().sum();
            if total <= 0.0 {
                return Err(Error::InvalidInput("Total weight is zero".to_string()));
            }
            let weighted_sum: f64 = values.iter().zip(w).map(|(x, w)| x * w).sum();
            Ok(weighted_sum / total)
        }
    }
}

/// Mean and variance of a sample
///
/// A single unweighted observation has variance 0.
pub fn moments(values: &[f64], weights: Option<&[f64]>) -> Result<Moments> {
    let mean = weighted_mean(values, weights)?;
    let n = values.len();

    let (variance, total_weight) = match weights {
        None => {
            let ss: f64 = values.iter().map(|x| (x - mean).powi(2)).sum();
            let variance = if n > 1 { ss / (n - 1) as f64 } else { 0.0 };
            (variance, n as f64)
        }
        Some(w) => {
            let total: f64 = w.iter().sum();
            let ss: f64 = values
                .iter()
                .zip(w)
                .map(|(x, w)| w * (x - mean).powi(2))
                .sum();
            (ss / total, total)
        }
    };

    Ok(Moments {
        mean,
        variance,
        n,
        total_weight,
        weighted: weights.is_some(),
    })
}
