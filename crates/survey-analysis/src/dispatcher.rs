//! Per-question orchestration
//!
//! A question moves through lookup, numeric coercion (mean and NPS), cleaning,
//! point estimation and interval dispatch. Any failure before the intervals
//! ends in [`QuestionStatus::Skipped`] with a warning; a failing interval only
//! drops that interval. Nothing a single question does can abort the run.

use crate::coercion::try_numeric_coercion;
use crate::config::{PriorSpec, QuestionSpec, StatisticKind, StatisticSpec, StudyConfig};
use crate::data::{ResponseValue, SurveyData};
use crate::sample::{resolve_weights, CleanedSample, WeightColumn};
use serde::Serialize;
use std::fmt;
use survey_confidence::{
    adjusted_confidence_level, bootstrap_mean_ci_with, bootstrap_proportion_ci_with,
    credible_interval_mean_with_n, credible_interval_proportion, mean_estimate, normal_ci,
    nps_bootstrap_ci_with, nps_credible_ci, nps_normal_ci, nps_point_estimate,
    proportion_estimate, t_ci_with_n, wilson_ci, Bootstrap, IntervalResult, NpsStats,
};
use survey_core::{effective_n, Error, ExecutionEngine, Result};
use tracing::{debug, instrument, warn};

/// Study-wide inputs shared read-only by every question of a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    /// Confidence level after any multiple comparison adjustment
    pub confidence_level: f64,
    pub bootstrap_iterations: usize,
    pub random_seed: Option<u64>,
    pub calculate_effective_n: bool,
    pub assumed_design_effect: Option<f64>,
    pub weights: Option<WeightColumn>,
}

impl RunContext {
    /// Validate the configuration and resolve the weight column
    ///
    /// # Errors
    /// `Configuration` when the run cannot start: invalid settings, no
    /// questions, or a weight variable absent from the data.
    pub fn from_config<D: SurveyData + ?Sized>(config: &StudyConfig, data: &D) -> Result<Self> {
        config.validate()?;
        let settings = &config.settings;

        let weights = match &settings.weight_variable {
            None => None,
            Some(name) => {
                let column = data.get_column(name).ok_or_else(|| {
                    Error::Configuration(format!("Weight variable '{name}' not found in data"))
                })?;
                Some(resolve_weights(column))
            }
        };

        let confidence_level = match settings.multiple_comparison {
            None => settings.confidence_level,
            Some(method) => {
                adjusted_confidence_level(
                    settings.confidence_level,
                    config.questions.len(),
                    method,
                )?
            }
        };

        Ok(Self {
            confidence_level,
            bootstrap_iterations: settings.bootstrap_iterations,
            random_seed: settings.random_seed,
            calculate_effective_n: settings.calculate_effective_n,
            assumed_design_effect: settings.assumed_design_effect,
            weights,
        })
    }

    pub fn is_weighted(&self) -> bool {
        self.weights.is_some()
    }

    /// Bootstrap seed for the question at configuration position `index`
    pub fn question_seed(&self, index: usize) -> Option<u64> {
        self.random_seed.map(|seed| seed.wrapping_add(index as u64))
    }

    /// Sample size handed to the estimators
    pub fn sample_size(&self, n: usize, weights: Option<&[f64]>) -> Result<f64> {
        match (weights, self.assumed_design_effect) {
            (Some(w), _) if self.calculate_effective_n => effective_n(w),
            (Some(_), _) => Ok(n as f64),
            (None, Some(deff)) => Ok(n as f64 / deff),
            (None, None) => Ok(n as f64),
        }
    }
}

/// Why a question produced no estimate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotFound,
    NonNumeric,
    NoValidCases,
    ZeroWeight,
    /// An estimator rejected the question; carries the error category
    Failed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("not found"),
            Self::NonNumeric => f.write_str("non-numeric"),
            Self::NoValidCases => f.write_str("no valid cases"),
            Self::ZeroWeight => f.write_str("zero weight"),
            Self::Failed(category) => write!(f, "{category} error"),
        }
    }
}

/// Terminal state of a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum QuestionStatus {
    Success,
    Skipped(SkipReason),
}

/// Point estimate of a successful question
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "statistic_type", rename_all = "snake_case")]
pub enum PointEstimate {
    Proportion { proportion: f64 },
    Mean { mean: f64, sd: f64 },
    Nps(NpsStats),
}

impl PointEstimate {
    /// Headline value: proportion, mean or NPS score
    pub fn value(&self) -> f64 {
        match self {
            Self::Proportion { proportion } => *proportion,
            Self::Mean { mean, .. } => *mean,
            Self::Nps(stats) => stats.nps_score,
        }
    }
}

/// Everything computed for one question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResult {
    pub question_id: String,
    pub statistic: StatisticKind,
    pub status: QuestionStatus,
    pub estimate: Option<PointEstimate>,
    /// Respondents with a valid response (and weight)
    pub n_raw: usize,
    /// Sample size used by the estimators
    pub n_eff: Option<f64>,
    /// Normal approximation, or Student-t for means
    pub moe: Option<IntervalResult>,
    pub wilson: Option<IntervalResult>,
    pub bootstrap: Option<IntervalResult>,
    pub credible: Option<IntervalResult>,
    pub warnings: Vec<String>,
}

impl QuestionResult {
    fn pending(spec: &QuestionSpec) -> Self {
        Self {
            question_id: spec.question_id.clone(),
            statistic: spec.statistic.kind(),
            status: QuestionStatus::Success,
            estimate: None,
            n_raw: 0,
            n_eff: None,
            moe: None,
            wilson: None,
            bootstrap: None,
            credible: None,
            warnings: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == QuestionStatus::Success
    }

    /// Computed intervals with their method slot names
    pub fn intervals(&self) -> impl Iterator<Item = (&'static str, &IntervalResult)> {
        [
            ("moe", &self.moe),
            ("wilson", &self.wilson),
            ("bootstrap", &self.bootstrap),
            ("credible", &self.credible),
        ]
        .into_iter()
        .filter_map(|(name, slot)| slot.as_ref().map(|interval| (name, interval)))
    }

    fn warn(&mut self, message: impl fmt::Display) {
        let warning = format!("{}: {message}", self.question_id);
        warn!("{warning}");
        self.warnings.push(warning);
    }

    fn skip(&mut self, reason: SkipReason, detail: impl fmt::Display) {
        self.warn(format_args!("skipped ({reason}): {detail}"));
        self.status = QuestionStatus::Skipped(reason);
        self.estimate = None;
        self.moe = None;
        self.wilson = None;
        self.bootstrap = None;
        self.credible = None;
    }

    /// Store one interval, or a warning explaining why it is missing
    fn record(&mut self, label: &str, outcome: Result<IntervalResult>) -> Option<IntervalResult> {
        match outcome {
            Ok(interval) => {
                for advisory in &interval.advisories {
                    self.warn(format_args!("{label}: {advisory}"));
                }
                Some(interval)
            }
            Err(err) => {
                self.warn(format_args!("{label} interval omitted ({}): {err}", err.category()));
                None
            }
        }
    }
}

/// Early exit from the question state machine
enum Halt {
    Skip(SkipReason, String),
    Error(Error),
}

impl From<Error> for Halt {
    fn from(err: Error) -> Self {
        Self::Error(err)
    }
}

type Step<T> = std::result::Result<T, Halt>;

/// Runs configured questions against survey data
#[derive(Debug, Clone)]
pub struct QuestionDispatcher<'a, D: ?Sized, E> {
    data: &'a D,
    context: &'a RunContext,
    engine: E,
}

impl<'a, D, E> QuestionDispatcher<'a, D, E>
where
    D: SurveyData + ?Sized,
    E: ExecutionEngine,
{
    /// `engine` runs the bootstrap resampling
    pub fn new(data: &'a D, context: &'a RunContext, engine: E) -> Self {
        Self {
            data,
            context,
            engine,
        }
    }

    pub fn context(&self) -> &RunContext {
        self.context
    }

    /// Process the question at configuration position `index`
    ///
    /// Never fails: problems end up in the result's status and warnings.
    #[instrument(
        skip(self, spec),
        fields(question = %spec.question_id, statistic = ?spec.statistic.kind())
    )]
    pub fn dispatch(&self, index: usize, spec: &QuestionSpec) -> QuestionResult {
        let mut result = QuestionResult::pending(spec);

        let Some(column) = self.data.get_column(&spec.question_id) else {
            result.skip(SkipReason::NotFound, "question not found in data");
            return result;
        };

        let outcome = match &spec.statistic {
            StatisticSpec::Proportion { categories } => {
                self.run_proportion(index, spec, column, categories, &mut result)
            }
            StatisticSpec::Mean => self.run_mean(index, spec, column, &mut result),
            StatisticSpec::Nps {
                promoter_codes,
                detractor_codes,
            } => self.run_nps(index, spec, column, promoter_codes, detractor_codes, &mut result),
        };

        match outcome {
            Ok(()) => debug!(n = result.n_raw, n_eff = ?result.n_eff, "question complete"),
            Err(Halt::Skip(reason, detail)) => result.skip(reason, detail),
            Err(Halt::Error(err)) => {
                result.skip(SkipReason::Failed(err.category().to_string()), err)
            }
        }
        result
    }

    fn bootstrap(&self, index: usize) -> Bootstrap<E> {
        Bootstrap::new(self.engine.clone())
            .with_resamples(self.context.bootstrap_iterations)
            .with_confidence_level(self.context.confidence_level)
            .with_seed(self.context.question_seed(index))
    }

    /// Cleaning and sample-size checks shared by every statistic
    fn prepare<T>(
        &self,
        responses: impl IntoIterator<Item = Option<T>>,
        result: &mut QuestionResult,
    ) -> Step<(CleanedSample<T>, f64)> {
        let sample = CleanedSample::from_responses(responses, self.context.weights.as_ref());
        if sample.is_empty() {
            return Err(Halt::Skip(
                SkipReason::NoValidCases,
                "no respondent has both a response and a usable weight".to_string(),
            ));
        }
        // resolve_weights drops non-positive weights; a hand-built context may still carry them
        if !(sample.total_weight() > 0.0) {
            return Err(Halt::Skip(
                SkipReason::ZeroWeight,
                "total weight of valid respondents is zero".to_string(),
            ));
        }
        let n_eff = self.context.sample_size(sample.len(), sample.weights())?;
        result.n_raw = sample.len();
        result.n_eff = Some(n_eff);
        debug!(n = sample.len(), dropped = sample.n_dropped, n_eff, "cleaned sample");
        Ok((sample, n_eff))
    }

    fn numeric_responses(
        &self,
        column: &[ResponseValue],
        result: &mut QuestionResult,
    ) -> Step<Vec<Option<f64>>> {
        let numeric = try_numeric_coercion(column).ok_or_else(|| {
            Halt::Skip(
                SkipReason::NonNumeric,
                "column could not be converted to numbers".to_string(),
            )
        })?;
        if numeric.was_coerced() {
            result.warn(format_args!(
                "converted {} text values to numbers; \
                {} could not be parsed and were treated as missing",
                numeric.n_converted, numeric.n_failed
            ));
        }
        Ok(numeric.values)
    }

    fn wilson_not_applicable(&self, spec: &QuestionSpec, result: &mut QuestionResult) {
        if spec.methods.run_wilson {
            result.warn("Wilson interval applies to proportions only; not computed");
        }
    }

    fn run_proportion(
        &self,
        index: usize,
        spec: &QuestionSpec,
        column: &[ResponseValue],
        categories: &[ResponseValue],
        result: &mut QuestionResult,
    ) -> Step<()> {
        let categories: Vec<ResponseValue> =
            categories.iter().map(ResponseValue::normalized).collect();
        let responses = column.iter().map(|cell| {
            let value = cell.normalized();
            (!value.is_missing()).then_some(value)
        });
        let (sample, n_eff) = self.prepare(responses, result)?;
        let weights = sample.weights();

        let p = proportion_estimate(&sample.values, &categories, weights)?;
        result.estimate = Some(PointEstimate::Proportion { proportion: p });

        let level = self.context.confidence_level;
        let methods = spec.methods;
        if methods.run_moe {
            result.moe = result.record("margin of error", normal_ci(p, n_eff, level));
        }
        if methods.run_wilson {
            result.wilson = result.record("Wilson", wilson_ci(p, n_eff, level));
        }
        if methods.run_bootstrap {
            let outcome = bootstrap_proportion_ci_with(
                &self.bootstrap(index),
                &sample.values,
                &categories,
                weights,
            );
            result.bootstrap = result.record("bootstrap", outcome);
        }
        if methods.run_credible {
            let PriorSpec { prior_mean, prior_n, .. } = spec.prior;
            let outcome = credible_interval_proportion(p, n_eff, level, prior_mean, prior_n);
            result.credible = result.record("credible", outcome);
        }
        Ok(())
    }

    fn run_mean(
        &self,
        index: usize,
        spec: &QuestionSpec,
        column: &[ResponseValue],
        result: &mut QuestionResult,
    ) -> Step<()> {
        let responses = self.numeric_responses(column, result)?;
        let (sample, n_eff) = self.prepare(responses, result)?;
        let weights = sample.weights();

        let estimate = mean_estimate(&sample.values, weights)?;
        result.estimate = Some(PointEstimate::Mean {
            mean: estimate.mean,
            sd: estimate.sd,
        });

        let level = self.context.confidence_level;
        let methods = spec.methods;
        self.wilson_not_applicable(spec, result);
        if methods.run_moe {
            result.moe = result.record("t", t_ci_with_n(&sample.values, weights, n_eff, level));
        }
        if methods.run_bootstrap {
            let outcome = bootstrap_mean_ci_with(&self.bootstrap(index), &sample.values, weights);
            result.bootstrap = result.record("bootstrap", outcome);
        }
        if methods.run_credible {
            let PriorSpec {
                prior_mean,
                prior_sd,
                prior_n,
            } = spec.prior;
            let outcome = credible_interval_mean_with_n(
                &sample.values,
                weights,
                n_eff,
                level,
                prior_mean,
                prior_sd,
                prior_n,
            );
            result.credible = result.record("credible", outcome);
        }
        Ok(())
    }

    fn run_nps(
        &self,
        index: usize,
        spec: &QuestionSpec,
        column: &[ResponseValue],
        promoter_codes: &[f64],
        detractor_codes: &[f64],
        result: &mut QuestionResult,
    ) -> Step<()> {
        let responses = self.numeric_responses(column, result)?;
        let (sample, n_eff) = self.prepare(responses, result)?;
        let weights = sample.weights();

        let stats = nps_point_estimate(&sample.values, promoter_codes, detractor_codes, weights)?;
        result.estimate = Some(PointEstimate::Nps(stats));

        let level = self.context.confidence_level;
        let methods = spec.methods;
        self.wilson_not_applicable(spec, result);
        if methods.run_moe {
            result.moe = result.record("margin of error", nps_normal_ci(&stats, n_eff, level));
        }
        if methods.run_bootstrap {
            let outcome = nps_bootstrap_ci_with(
                &self.bootstrap(index),
                &sample.values,
                promoter_codes,
                detractor_codes,
                weights,
            );
            result.bootstrap = result.record("bootstrap", outcome);
        }
        if methods.run_credible {
            let PriorSpec {
                prior_mean,
                prior_sd,
                prior_n,
            } = spec.prior;
            let outcome = nps_credible_ci(&stats, n_eff, level, prior_mean, prior_sd, prior_n);
            result.credible = result.record("credible", outcome);
        }
        Ok(())
    }
}
