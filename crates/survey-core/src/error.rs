//! Error types for survey estimation
//!
//! Provides a unified error type for all survey-stats crates. The variants map
//! onto how a failure is treated by the question dispatcher: configuration
//! errors are caller bugs, while insufficient or invalid data only skips the
//! affected question.

use thiserror::Error;

/// Core error type for survey estimation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// An estimator parameter precondition was violated by the caller
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Not enough valid observations for the requested statistic
    #[error("Insufficient data: expected at least {expected} observations, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    /// Malformed numeric input (NaN proportion, negative sample size, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Numerical computation error
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error for empty input
    pub fn empty_input(_operation: &str) -> Self {
        Self::InsufficientData {
            expected: 1,
            actual: 0,
        }
    }

    /// Create an error for a confidence level outside (0, 1)
    pub fn invalid_confidence_level(level: f64) -> Self {
        Self::Configuration(format!("Confidence level {level} must be in (0, 1)"))
    }

    /// Create an error for size mismatch
    pub fn size_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::InvalidInput(format!(
            "Size mismatch in {context}: expected {expected}, got {actual}"
        ))
    }

    /// Create an error for NaN/Inf values
    pub fn non_finite(context: &str) -> Self {
        Self::InvalidInput(format!("{context} contains NaN or infinite values"))
    }

    /// Short stable name of the error class, used to tag run warnings
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::InsufficientData { .. } => "insufficient data",
            Self::InvalidInput(_) => "invalid input",
            Self::Computation(_) => "computation",
        }
    }

    /// Whether the failure is a caller bug rather than a data problem
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
