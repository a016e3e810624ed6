//! Whole-sample weighting summary

use crate::dispatcher::RunContext;
use crate::sample::WeightColumn;
use serde::Serialize;
use survey_core::{Result, WeightSummary};
use tracing::debug;

/// Actual n, effective n and design effect for the whole study
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyLevelStatistics {
    /// Rows in the survey data
    pub n_respondents: usize,
    /// Respondents entering the weighting summary (all of them when unweighted)
    pub actual_n: usize,
    pub effective_n: f64,
    pub design_effect: f64,
    pub weighted: bool,
    /// Whether the design effect was assumed rather than computed from weights
    pub design_effect_assumed: bool,
    pub min_weight: Option<f64>,
    pub max_weight: Option<f64>,
    /// Largest over smallest weight
    pub weight_ratio: Option<f64>,
}

impl StudyLevelStatistics {
    /// Summarise the sample for a run
    ///
    /// Weighted studies use every respondent with a usable weight.
    /// Unweighted studies report `n` with DEFF 1, or the assumed DEFF.
    pub fn compute(n_respondents: usize, context: &RunContext) -> Result<Self> {
        match &context.weights {
            Some(column) => Self::from_weights(n_respondents, column),
            None => Ok(Self::unweighted(n_respondents, context.assumed_design_effect)),
        }
    }

    fn from_weights(n_respondents: usize, column: &WeightColumn) -> Result<Self> {
        let weights: Vec<f64> = column.iter().flatten().copied().collect();
        let summary = WeightSummary::from_weights(&weights)?;
        debug!(
            n = summary.n,
            n_eff = summary.effective_n,
            deff = summary.design_effect,
            "study weighting summary"
        );
        Ok(Self {
            n_respondents,
            actual_n: summary.n,
            effective_n: summary.effective_n,
            design_effect: summary.design_effect,
            weighted: true,
            design_effect_assumed: false,
            min_weight: Some(summary.min),
            max_weight: Some(summary.max),
            weight_ratio: Some(summary.weight_ratio()),
        })
    }

    fn unweighted(n_respondents: usize, assumed_design_effect: Option<f64>) -> Self {
        let design_effect = assumed_design_effect.unwrap_or(1.0);
        Self {
            n_respondents,
            actual_n: n_respondents,
            effective_n: n_respondents as f64 / design_effect,
            design_effect,
            weighted: false,
            design_effect_assumed: assumed_design_effect.is_some(),
            min_weight: None,
            max_weight: None,
            weight_ratio: None,
        }
    }
}
