//! Confidence intervals for survey proportions, means and Net Promoter Scores
//!
//! This crate re-exports the workspace members:
//!
//! - [`survey_core`]: error type, design-weight statistics, execution engines
//! - [`survey_confidence`]: the interval estimators
//! - [`survey_analysis`]: configuration, per-question dispatch and analysis runs
//!
//! Most users only need the [`prelude`].
//!
//! ```rust
//! use survey_stats::prelude::*;
//!
//! let ci = wilson_ci(0.05, 200.0, 0.95).unwrap();
//! assert!(ci.lower() > 0.0);
//! ```

pub use survey_analysis;
pub use survey_confidence;
pub use survey_core;

pub mod prelude {
    pub use survey_analysis::{
        run_analysis, run_analysis_with, AnalysisReport, MethodFlags, PointEstimate, PriorSpec,
        QuestionResult, QuestionSpec, QuestionStatus, StatisticSpec, StudyConfig,
        StudyLevelStatistics, StudySettings, SurveyData, SurveyTable,
    };
    #[cfg(feature = "parallel")]
    pub use survey_analysis::run_analysis_parallel;
    pub use survey_confidence::{
        bootstrap_mean_ci, bootstrap_proportion_ci, credible_interval_mean,
        credible_interval_proportion, normal_ci, nps_bootstrap_ci, nps_credible_ci,
        nps_normal_ci, nps_point_estimate, t_ci, wilson_ci, Bootstrap, ConfidenceInterval,
        IntervalMethod, IntervalResult,
    };
    pub use survey_core::{design_effect, effective_n, Error, Result};
}
