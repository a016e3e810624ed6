//! Design-weight statistics
//!
//! Kish's effective sample size and the weighting design effect. Both assume
//! the caller already removed respondents with missing or non-positive
//! weights; the unweighted path never calls into this module and uses the raw
//! sample size directly.

use crate::{Error, Result};

fn validate_weights(weights: &[f64]) -> Result<()> {
    if weights.is_empty() {
        return Err(Error::empty_input("weights"));
    }
    if weights.iter().any(|w| !w.is_finite()) {
        return Err(Error::non_finite("weights"));
    }
    if weights.iter().any(|&w| w < 0.0) {
        return Err(Error::InvalidInput(
            "Weights must be non-negative".to_string(),
        ));
    }
    Ok(())
}

/// Kish effective sample size, `(Σw)² / Σw²`
///
/// Returns `weights.len()` (up to rounding) when all weights are equal.
///
/// # Errors
/// `InvalidInput` when the weights are empty, non-finite, negative, or sum to
/// zero.
pub fn effective_n(weights: &[f64]) -> Result<f64> {
    validate_weights(weights)?;

    let sum: f64 = weights.iter().sum();
    let sum_sq: f64 = weights.iter().map(|w| w * w).sum();
    if sum <= 0.0 || sum_sq <= 0.0 {
        return Err(Error::InvalidInput(
            "All weights are zero; effective sample size is undefined".to_string(),
        ));
    }

    Ok(sum * sum / sum_sq)
}

/// Weighting design effect, `1 + CV²` with the population standard deviation
///
/// Identical (within floating-point tolerance) to `n / effective_n(weights)`.
pub fn design_effect(weights: &[f64]) -> Result<f64> {
    validate_weights(weights)?;

    let n = weights.len() as f64;
    let mean = weights.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return Err(Error::InvalidInput(
            "All weights are zero; design effect is undefined".to_string(),
        ));
    }
    let variance = weights.iter().map(|w| (w - mean).powi(2)).sum::<f64>() / n;
    let cv = variance.sqrt() / mean;

    Ok(1.0 + cv * cv)
}

/// Summary of a cleaned weight vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightSummary {
    /// Number of weights
    pub n: usize,
    /// Sum of weights
    pub total: f64,
    /// Smallest weight
    pub min: f64,
    /// Largest weight
    pub max: f64,
    /// Kish effective sample size
    pub effective_n: f64,
    /// Design effect, `1 + CV²`
    pub design_effect: f64,
}

impl WeightSummary {
    /// Summarise a weight vector
    pub fn from_weights(weights: &[f64]) -> Result<Self> {
        let effective_n = effective_n(weights)?;
        let design_effect = design_effect(weights)?;
        let (min, max) = weights
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &w| {
                (lo.min(w), hi.max(w))
            });

        Ok(Self {
            n: weights.len(),
            total: weights.iter().sum(),
            min,
            max,
            effective_n,
            design_effect,
        })
    }

    /// Ratio of the largest to the smallest weight
    pub fn weight_ratio(&self) -> f64 {
        if self.min > 0.0 {
            self.max / self.min
        } else {
            f64::INFINITY
        }
    }
}
