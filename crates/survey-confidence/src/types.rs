//! Common types for confidence intervals

use serde::Serialize;
use std::fmt;
use survey_core::{math, Error, Result};

/// A confidence interval with lower and upper bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    /// Lower bound of the interval
    pub lower: f64,
    /// Upper bound of the interval
    pub upper: f64,
    /// The point estimate the interval is reported against
    pub estimate: f64,
    /// Confidence level (e.g., 0.95 for 95% CI)
    pub confidence_level: f64,
}

impl ConfidenceInterval {
    /// Create a new confidence interval
    pub fn new(lower: f64, upper: f64, estimate: f64, confidence_level: f64) -> Self {
        Self {
            lower,
            upper,
            estimate,
            confidence_level,
        }
    }

    /// Clamp both bounds into `[min, max]`
    pub fn clamped(self, min: f64, max: f64) -> Self {
        Self {
            lower: self.lower.clamp(min, max),
            upper: self.upper.clamp(min, max),
            ..self
        }
    }

    /// Width of the confidence interval
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Margin of error (half-width)
    pub fn margin_of_error(&self) -> f64 {
        self.width() / 2.0
    }

    /// Check if a value is contained in the interval
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// Check if intervals overlap
    pub fn overlaps(&self, other: &ConfidenceInterval) -> bool {
        self.lower <= other.upper && other.lower <= self.upper
    }
}

impl fmt::Display for ConfidenceInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}% CI: [{:.4}, {:.4}], estimate: {:.4}",
            self.confidence_level * 100.0,
            self.lower,
            self.upper,
            self.estimate
        )
    }
}

/// Confidence level type with validation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceLevel(f64);

impl ConfidenceLevel {
    /// Create a new confidence level
    ///
    /// # Errors
    /// `Configuration` if level is not in (0, 1)
    pub fn new(level: f64) -> Result<Self> {
        if !(level > 0.0 && level < 1.0) {
            return Err(Error::invalid_confidence_level(level));
        }
        Ok(Self(level))
    }

    /// Get the confidence level value
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Get the alpha level (1 - confidence level)
    pub fn alpha(&self) -> f64 {
        1.0 - self.0
    }

    /// Get the tail probability (alpha/2 for two-tailed)
    pub fn tail_probability(&self) -> f64 {
        self.alpha() / 2.0
    }

    /// Two-sided normal critical value
    pub fn z_critical(&self) -> Result<f64> {
        math::z_critical(self.0)
    }

    /// Two-sided Student-t critical value
    pub fn t_critical(&self, df: f64) -> Result<f64> {
        math::t_critical(self.0, df)
    }

    /// Common confidence levels
    pub const NINETY: Self = Self(0.90);
    pub const NINETY_FIVE: Self = Self(0.95);
    pub const NINETY_NINE: Self = Self(0.99);
}

impl TryFrom<f64> for ConfidenceLevel {
    type Error = Error;

    fn try_from(level: f64) -> Result<Self> {
        Self::new(level)
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.0 * 100.0)
    }
}

/// Interval construction used for an [`IntervalResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalMethod {
    /// Normal approximation (classic margin of error)
    NormalApproximation,
    /// Wilson score interval
    Wilson,
    /// Student-t interval for a mean
    StudentT,
    /// Percentile bootstrap
    Bootstrap,
    /// Beta-Binomial credible interval
    CredibleBeta,
    /// Normal-Normal credible interval
    CredibleNormal,
}

impl IntervalMethod {
    /// Human-readable method name
    pub fn name(&self) -> &'static str {
        match self {
            Self::NormalApproximation => "Normal Approximation",
            Self::Wilson => "Wilson Score",
            Self::StudentT => "Student-t",
            Self::Bootstrap => "Percentile Bootstrap",
            Self::CredibleBeta => "Bayesian Beta-Binomial",
            Self::CredibleNormal => "Bayesian Normal-Normal",
        }
    }
}

impl fmt::Display for IntervalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Method-specific quantities behind an interval
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostics {
    Normal {
        standard_error: f64,
        critical_value: f64,
        sample_size: f64,
    },
    Wilson {
        center: f64,
        margin: f64,
        critical_value: f64,
        sample_size: f64,
    },
    StudentT {
        standard_error: f64,
        standard_deviation: f64,
        degrees_of_freedom: f64,
        critical_value: f64,
    },
    Bootstrap {
        n_resamples: usize,
        /// Resamples whose statistic was finite
        n_valid: usize,
        bootstrap_mean: f64,
        bootstrap_se: f64,
        /// Sorted bootstrap draws; not serialised into reports
        #[serde(skip_serializing)]
        draws: Vec<f64>,
    },
    BetaPosterior {
        prior_alpha: f64,
        prior_beta: f64,
        posterior_alpha: f64,
        posterior_beta: f64,
    },
    NormalPosterior {
        prior_mean: Option<f64>,
        prior_sd: Option<f64>,
        posterior_mean: f64,
        posterior_sd: f64,
    },
}

/// One confidence or credible interval with its diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalResult {
    pub method: IntervalMethod,
    pub interval: ConfidenceInterval,
    pub diagnostics: Diagnostics,
    /// Non-fatal notes about approximation quality or defaulted parameters
    pub advisories: Vec<String>,
}

impl IntervalResult {
    pub fn new(
        method: IntervalMethod,
        interval: ConfidenceInterval,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            method,
            interval,
            diagnostics,
            advisories: Vec::new(),
        }
    }

    pub fn with_advisory(mut self, advisory: impl Into<String>) -> Self {
        self.advisories.push(advisory.into());
        self
    }

    pub fn lower(&self) -> f64 {
        self.interval.lower
    }

    pub fn upper(&self) -> f64 {
        self.interval.upper
    }

    pub fn estimate(&self) -> f64 {
        self.interval.estimate
    }

    pub fn width(&self) -> f64 {
        self.interval.width()
    }

    pub fn margin_of_error(&self) -> f64 {
        self.interval.margin_of_error()
    }

    /// Standard error, when the method defines one
    pub fn standard_error(&self) -> Option<f64> {
        match &self.diagnostics {
            Diagnostics::Normal { standard_error, .. }
            | Diagnostics::StudentT { standard_error, .. } => Some(*standard_error),
            Diagnostics::Bootstrap { bootstrap_se, .. } => Some(*bootstrap_se),
            Diagnostics::NormalPosterior { posterior_sd, .. } => Some(*posterior_sd),
            Diagnostics::Wilson { .. } | Diagnostics::BetaPosterior { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_interval() {
        let ci = ConfidenceInterval::new(2.0, 8.0, 5.0, 0.95);

        assert_eq!(ci.width(), 6.0);
        assert_eq!(ci.margin_of_error(), 3.0);
        assert!(ci.contains(5.0));
        assert!(!ci.contains(1.0));
        assert!(!ci.contains(9.0));
    }

    #[test]
    fn test_overlap() {
        let ci1 = ConfidenceInterval::new(2.0, 6.0, 4.0, 0.95);
        let ci2 = ConfidenceInterval::new(4.0, 8.0, 6.0, 0.95);
        let ci3 = ConfidenceInterval::new(7.0, 9.0, 8.0, 0.95);

        assert!(ci1.overlaps(&ci2));
        assert!(ci2.overlaps(&ci1));
        assert!(!ci1.overlaps(&ci3));
    }

    #[test]
    fn test_clamped() {
        let ci = ConfidenceInterval::new(-0.02, 0.4, 0.1, 0.95).clamped(0.0, 1.0);
        assert_eq!(ci.lower, 0.0);
        assert_eq!(ci.upper, 0.4);
        assert_eq!(ci.estimate, 0.1);
    }

    #[test]
    fn test_confidence_level() {
        let level = ConfidenceLevel::new(0.95).unwrap();
        assert_eq!(level.value(), 0.95);
        assert!((level.alpha() - 0.05).abs() < 1e-10);
        assert!((level.tail_probability() - 0.025).abs() < 1e-10);
        assert!((level.z_critical().unwrap() - 1.959964).abs() < 1e-5);
    }

    #[test]
    fn test_invalid_confidence_level() {
        assert!(matches!(ConfidenceLevel::new(1.5), Err(Error::Configuration(_))));
        assert!(ConfidenceLevel::new(0.0).is_err());
        assert!(ConfidenceLevel::try_from(f64::NAN).is_err());
    }

    #[test]
    fn test_confidence_interval_display() {
        let ci = ConfidenceInterval::new(2.5, 7.5, 5.0, 0.95);
        let display = format!("{}", ci);
        assert!(display.contains("95.0%"));
        assert!(display.contains("2.5000"));
        assert!(display.contains("7.5000"));
        assert!(display.contains("5.0000"));
    }

    #[test]
    fn test_confidence_level_display() {
        assert_eq!(format!("{}", ConfidenceLevel::NINETY_FIVE), "95.0%");
        assert_eq!(format!("{}", ConfidenceLevel::NINETY_NINE), "99.0%");
    }

    #[test]
    fn test_standard_error_accessor() {
        let result = IntervalResult::new(
            IntervalMethod::NormalApproximation,
            ConfidenceInterval::new(0.4, 0.5, 0.45, 0.95),
            Diagnostics::Normal {
                standard_error: 0.0157,
                critical_value: 1.96,
                sample_size: 1000.0,
            },
        );
        assert_eq!(result.standard_error(), Some(0.0157));
        assert_eq!(result.method.name(), "Normal Approximation");
    }
}
