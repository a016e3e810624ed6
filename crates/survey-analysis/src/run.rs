//! Analysis runs
//!
//! Questions are independent: each one reads the shared data and context and
//! returns its own result with its own warnings. The run concatenates the
//! warnings in configuration order, whichever engine processed the questions.

use crate::config::StudyConfig;
use crate::data::SurveyData;
use crate::dispatcher::{QuestionDispatcher, QuestionResult, RunContext};
use crate::study::StudyLevelStatistics;
use crate::warnings::RunWarnings;
use serde::Serialize;
use survey_confidence::MultipleComparisonMethod;
use survey_core::{ExecutionEngine, Result, SequentialEngine};
use tracing::{info, instrument, warn};

/// Everything the report writer needs from a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub study: StudyLevelStatistics,
    /// One entry per configured question, in configuration order
    pub results: Vec<QuestionResult>,
    pub warnings: RunWarnings,
    /// Per-question confidence level after any adjustment
    pub applied_confidence_level: f64,
    pub multiple_comparison: Option<MultipleComparisonMethod>,
}

impl AnalysisReport {
    /// Questions that produced an estimate
    pub fn successful(&self) -> impl Iterator<Item = &QuestionResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &QuestionResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    pub fn result(&self, question_id: &str) -> Option<&QuestionResult> {
        self.results.iter().find(|r| r.question_id == question_id)
    }

    /// Serialise the report as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            survey_core::Error::Computation(format!("Failed to serialise report: {e}"))
        })
    }
}

/// Run every configured question sequentially
///
/// # Errors
/// Only run-level configuration problems; question failures become warnings.
pub fn run_analysis<D: SurveyData + ?Sized>(
    config: &StudyConfig,
    data: &D,
) -> Result<AnalysisReport> {
    run_analysis_with(config, data, SequentialEngine)
}

/// Run questions sequentially, bootstrapping on `engine`
#[instrument(skip_all, fields(questions = config.questions.len(), strategy = ?engine.strategy()))]
pub fn run_analysis_with<D, E>(config: &StudyConfig, data: &D, engine: E) -> Result<AnalysisReport>
where
    D: SurveyData + ?Sized,
    E: ExecutionEngine,
{
    let context = RunContext::from_config(config, data)?;
    info!(
        respondents = data.n_respondents(),
        confidence_level = context.confidence_level,
        "starting survey analysis"
    );

    let dispatcher = QuestionDispatcher::new(data, &context, engine);
    let results = config
        .questions
        .iter()
        .enumerate()
        .map(|(index, spec)| dispatcher.dispatch(index, spec))
        .collect();

    assemble(config, data, &context, results)
}

/// Process questions concurrently on Rayon's pool
///
/// Each question bootstraps sequentially inside its worker. Results and
/// warnings come back in configuration order.
#[cfg(feature = "parallel")]
#[instrument(skip_all, fields(questions = config.questions.len()))]
pub fn run_analysis_parallel<D>(config: &StudyConfig, data: &D) -> Result<AnalysisReport>
where
    D: SurveyData + Sync + ?Sized,
{
    let context = RunContext::from_config(config, data)?;
    info!(
        respondents = data.n_respondents(),
        confidence_level = context.confidence_level,
        "starting parallel survey analysis"
    );

    let dispatcher = QuestionDispatcher::new(data, &context, SequentialEngine);
    let results = survey_core::parallel().execute_batch(config.questions.len(), |index| {
        dispatcher.dispatch(index, &config.questions[index])
    });

    assemble(config, data, &context, results)
}

fn assemble<D: SurveyData + ?Sized>(
    config: &StudyConfig,
    data: &D,
    context: &RunContext,
    results: Vec<QuestionResult>,
) -> Result<AnalysisReport> {
    let mut warnings = RunWarnings::new();
    if let Some(method) = config.settings.multiple_comparison {
        if !method.narrows_level() {
            let warning = format!(
                "{method} selected: with every question reported the confidence level stays at {}",
                context.confidence_level
            );
            warn!("{warning}");
            warnings.push(warning);
        }
    }
    for result in &results {
        warnings.extend(result.warnings.iter().cloned());
    }

    let study = match StudyLevelStatistics::compute(data.n_respondents(), context) {
        Ok(study) => study,
        Err(err) => {
            warn!("Study-level statistics unavailable: {err}");
            warnings.push(format!("Study-level statistics unavailable: {err}"));
            StudyLevelStatistics::compute(data.n_respondents(), &RunContext {
                weights: None,
                assumed_design_effect: None,
                ..context.clone()
            })?
        }
    };

    let n_success = results.iter().filter(|r| r.is_success()).count();
    info!(
        succeeded = n_success,
        skipped = results.len() - n_success,
        warnings = warnings.len(),
        "survey analysis complete"
    );

    Ok(AnalysisReport {
        study,
        results,
        warnings,
        applied_confidence_level: context.confidence_level,
        multiple_comparison: config.settings.multiple_comparison,
    })
}
