//! Survey confidence analysis runs
//!
//! Ties the estimators of `survey-confidence` to configured questions and
//! tabular survey data:
//!
//! - [`config`]: serde model of study settings and questions
//! - [`data`]: the [`SurveyData`] collaborator trait and an in-memory table
//! - [`coercion`]: the text-to-number acceptance policy
//! - [`dispatcher`]: the per-question state machine
//! - [`study`]: whole-sample effective n and design effect
//! - [`run`]: sequential and parallel runs producing an [`AnalysisReport`]
//!
//! # Example
//!
//! ```rust
//! use survey_analysis::{
//!     run_analysis, MethodFlags, QuestionSpec, StatisticSpec, StudyConfig, StudySettings,
//!     SurveyTable,
//! };
//!
//! let data = SurveyTable::new()
//!     .with_column("satisfied", (0..100).map(|i| if i % 3 == 0 { "yes" } else { "no" }))
//!     .unwrap();
//! let question = QuestionSpec::new(
//!     "satisfied",
//!     StatisticSpec::Proportion { categories: vec!["yes".into()] },
//! )
//! .with_methods(MethodFlags { run_wilson: true, ..Default::default() });
//!
//! let config = StudyConfig::new(StudySettings::default(), vec![question]);
//! let report = run_analysis(&config, &data).unwrap();
//! let wilson = report.results[0].wilson.as_ref().unwrap();
//! assert!(wilson.lower() < 0.34 && 0.34 < wilson.upper());
//! ```

pub mod coercion;
pub mod config;
pub mod data;
pub mod dispatcher;
pub mod run;
pub mod sample;
pub mod study;
pub mod warnings;

pub use coercion::{try_numeric_coercion, NumericValues};
pub use config::{
    MethodFlags, PriorSpec, QuestionSpec, StatisticKind, StatisticSpec, StudyConfig, StudySettings,
};
pub use data::{ResponseValue, SurveyData, SurveyTable};
pub use dispatcher::{
    PointEstimate, QuestionDispatcher, QuestionResult, QuestionStatus, RunContext, SkipReason,
};
pub use run::{run_analysis, run_analysis_with, AnalysisReport};
#[cfg(feature = "parallel")]
pub use run::run_analysis_parallel;
pub use sample::CleanedSample;
pub use study::StudyLevelStatistics;
pub use warnings::RunWarnings;
