//! Core types and building blocks for survey confidence intervals
//!
//! This crate provides the pieces every estimator in the workspace shares:
//!
//! - [`Error`] and [`Result`], the error taxonomy the question dispatcher uses
//!   to decide between skipping a question and aborting a run
//! - [`weights`]: Kish effective sample size and the weighting design effect
//! - [`moments`]: weighted and unweighted means and variances
//! - [`math`]: normal, Student-t and beta quantiles
//! - [`execution`]: sequential and Rayon-backed execution engines
//!
//! # Example
//!
//! ```rust
//! use survey_core::weights::{design_effect, effective_n};
//!
//! let weights = vec![1.0, 1.0, 2.0, 4.0];
//! let n_eff = effective_n(&weights).unwrap();
//! let deff = design_effect(&weights).unwrap();
//!
//! assert!((weights.len() as f64 / n_eff - deff).abs() < 1e-12);
//! ```

pub mod error;
pub mod execution;
pub mod math;
pub mod moments;
pub mod weights;

// Re-export core types
pub use error::{Error, Result};

pub use execution::{sequential, ExecutionEngine, ExecutionStrategy, SequentialEngine};
#[cfg(feature = "parallel")]
pub use execution::{parallel, ParallelEngine};

pub use moments::{moments, weighted_mean, Moments};
pub use weights::{design_effect, effective_n, WeightSummary};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
