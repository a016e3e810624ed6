//! Confidence and credible intervals for survey estimates
//!
//! This crate implements the interval constructions used for survey
//! questions:
//!
//! - **Proportions**: normal approximation (margin of error), Wilson score,
//!   percentile bootstrap and Beta-Binomial credible intervals
//! - **Means**: Student-t, percentile bootstrap and Normal-Normal credible
//!   intervals
//! - **Net Promoter Score**: normal approximation, percentile bootstrap and a
//!   Normal-Normal credible interval on the NPS scale
//!
//! Sample sizes are effective sample sizes: pass the Kish `n_eff` from
//! [`survey_core::effective_n`] when design weights are in play.
//!
//! # Examples
//!
//! ```rust
//! use survey_confidence::{normal_ci, wilson_ci};
//!
//! let moe = normal_ci(0.45, 1000.0, 0.95).unwrap();
//! assert!((moe.margin_of_error() - 0.0308).abs() < 1e-3);
//!
//! let wilson = wilson_ci(0.01, 50.0, 0.95).unwrap();
//! assert!(wilson.lower() > 0.0);
//! ```
//!
//! Bootstraps can run on a parallel engine:
//!
//! ```rust,ignore
//! use survey_confidence::{bootstrap_mean_ci_with, Bootstrap};
//! use survey_core::parallel;
//!
//! let bootstrap = Bootstrap::new(parallel()).with_resamples(10_000).with_seed(Some(1));
//! let ci = bootstrap_mean_ci_with(&bootstrap, &values, None)?;
//! ```

pub mod adjustment;
mod bootstrap;
pub mod mean;
pub mod nps;
pub mod proportion;
mod types;

pub use adjustment::{adjusted_confidence_level, MultipleComparisonMethod};
pub use bootstrap::{Bootstrap, BootstrapDistribution, DEFAULT_RESAMPLES, MIN_RESAMPLES};
pub use mean::{
    bootstrap_mean_ci, bootstrap_mean_ci_with, credible_interval_mean,
    credible_interval_mean_with_n, mean_estimate, t_ci, t_ci_with_n, MeanEstimate,
};
pub use nps::{
    nps_bootstrap_ci, nps_bootstrap_ci_with, nps_credible_ci, nps_normal_ci, nps_point_estimate,
    NpsStats,
};
pub use proportion::{
    bootstrap_proportion_ci, bootstrap_proportion_ci_with, credible_interval_proportion,
    normal_ci, proportion_estimate, wilson_ci,
};
pub use types::{ConfidenceInterval, ConfidenceLevel, Diagnostics, IntervalMethod, IntervalResult};
