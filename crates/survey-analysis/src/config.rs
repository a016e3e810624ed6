//! Study and question configuration
//!
//! The model is plain `serde` data so any front end (spreadsheet reader, JSON
//! file, test fixture) can produce it. [`StudyConfig::validate`] holds the
//! checks that abort a run; everything else is handled per question.

use crate::data::ResponseValue;
use serde::{Deserialize, Serialize};
use survey_confidence::{MultipleComparisonMethod, DEFAULT_RESAMPLES};
use survey_core::{Error, Result};

/// Study-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudySettings {
    pub confidence_level: f64,
    /// Bootstrap resamples per interval (at least 1000)
    pub bootstrap_iterations: usize,
    /// Column holding design weights; `None` for an unweighted study
    pub weight_variable: Option<String>,
    /// Base seed; question `i` bootstraps with `random_seed + i`
    pub random_seed: Option<u64>,
    /// Use Kish effective n for weighted studies (raw n otherwise)
    pub calculate_effective_n: bool,
    /// Design effect assumed for an unweighted study
    pub assumed_design_effect: Option<f64>,
    pub multiple_comparison: Option<MultipleComparisonMethod>,
}

impl Default for StudySettings {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            bootstrap_iterations: DEFAULT_RESAMPLES,
            weight_variable: None,
            random_seed: None,
            calculate_effective_n: true,
            assumed_design_effect: None,
            multiple_comparison: None,
        }
    }
}

/// Statistic computed for a question, with its category or code lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "statistic_type", rename_all = "snake_case")]
pub enum StatisticSpec {
    Proportion {
        /// Response codes counted as a "success"
        categories: Vec<ResponseValue>,
    },
    Mean,
    Nps {
        promoter_codes: Vec<f64>,
        detractor_codes: Vec<f64>,
    },
}

impl StatisticSpec {
    pub fn kind(&self) -> StatisticKind {
        match self {
            Self::Proportion { .. } => StatisticKind::Proportion,
            Self::Mean => StatisticKind::Mean,
            Self::Nps { .. } => StatisticKind::Nps,
        }
    }

    /// NPS with the conventional 0-10 codes: 9-10 promote, 0-6 detract
    pub fn standard_nps() -> Self {
        Self::Nps {
            promoter_codes: vec![9.0, 10.0],
            detractor_codes: (0..=6).map(f64::from).collect(),
        }
    }
}

/// Statistic type without its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticKind {
    Proportion,
    Mean,
    Nps,
}

/// Interval methods enabled for a question
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodFlags {
    /// Normal approximation (Student-t for means)
    pub run_moe: bool,
    /// Wilson score; proportions only
    pub run_wilson: bool,
    pub run_bootstrap: bool,
    pub run_credible: bool,
}

impl MethodFlags {
    pub fn all() -> Self {
        Self {
            run_moe: true,
            run_wilson: true,
            run_bootstrap: true,
            run_credible: true,
        }
    }

    pub fn any(&self) -> bool {
        self.run_moe || self.run_wilson || self.run_bootstrap || self.run_credible
    }
}

/// Prior for credible intervals; all fields optional
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorSpec {
    pub prior_mean: Option<f64>,
    pub prior_sd: Option<f64>,
    pub prior_n: Option<f64>,
}

/// One configured question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSpec {
    /// Column name of the question in the survey data
    pub question_id: String,
    pub statistic: StatisticSpec,
    #[serde(default)]
    pub methods: MethodFlags,
    #[serde(default)]
    pub prior: PriorSpec,
}

impl QuestionSpec {
    pub fn new(question_id: impl Into<String>, statistic: StatisticSpec) -> Self {
        Self {
            question_id: question_id.into(),
            statistic,
            methods: MethodFlags::default(),
            prior: PriorSpec::default(),
        }
    }

    pub fn with_methods(mut self, methods: MethodFlags) -> Self {
        self.methods = methods;
        self
    }

    pub fn with_prior(mut self, prior: PriorSpec) -> Self {
        self.prior = prior;
        self
    }
}

/// Complete analysis configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyConfig {
    #[serde(default)]
    pub settings: StudySettings,
    pub questions: Vec<QuestionSpec>,
}

impl StudyConfig {
    pub fn new(settings: StudySettings, questions: Vec<QuestionSpec>) -> Self {
        Self { settings, questions }
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::Configuration(format!("Invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Run-level checks; a failure here aborts the whole analysis
    pub fn validate(&self) -> Result<()> {
        if self.questions.is_empty() {
            return Err(Error::Configuration("No questions configured".to_string()));
        }
        let level = self.settings.confidence_level;
        if !(level > 0.0 && level < 1.0) {
            return Err(Error::invalid_confidence_level(level));
        }
        if let Some(deff) = self.settings.assumed_design_effect {
            if !(deff.is_finite() && deff >= 1.0) {
                return Err(Error::Configuration(format!(
                    "Assumed design effect {deff} must be at least 1"
                )));
            }
        }
        if let Some(weight_variable) = &self.settings.weight_variable {
            if weight_variable.trim().is_empty() {
                return Err(Error::Configuration(
                    "weight_variable must not be blank".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "settings": {
            "confidence_level": 0.9,
            "bootstrap_iterations": 2000,
            "weight_variable": "wt",
            "random_seed": 42
        },
        "questions": [
            {
                "question_id": "Q1",
                "statistic": {"statistic_type": "proportion", "categories": [4, 5, "Top box"]},
                "methods": {"run_moe": true, "run_wilson": true}
            },
            {
                "question_id": "Q2",
                "statistic": {"statistic_type": "mean"},
                "methods": {"run_credible": true},
                "prior": {"prior_mean": 7.0, "prior_sd": 1.5}
            },
            {
                "question_id": "NPS",
                "statistic": {
                    "statistic_type": "nps",
                    "promoter_codes": [9, 10],
                    "detractor_codes": [0, 1, 2, 3, 4, 5, 6]
                }
            }
        ]
    }"#;

    #[test]
    fn test_parse_config() {
        let config = StudyConfig::from_json_str(CONFIG).unwrap();
        assert_eq!(config.settings.confidence_level, 0.9);
        assert_eq!(config.settings.weight_variable.as_deref(), Some("wt"));
        assert!(config.settings.calculate_effective_n);
        assert_eq!(config.questions.len(), 3);

        let q1 = &config.questions[0];
        assert_eq!(q1.statistic.kind(), StatisticKind::Proportion);
        assert!(q1.methods.run_moe && q1.methods.run_wilson && !q1.methods.run_bootstrap);
        match &q1.statistic {
            StatisticSpec::Proportion { categories } => {
                assert_eq!(categories[0], ResponseValue::Number(4.0));
                assert_eq!(categories[2], ResponseValue::from("Top box"));
            }
            other => panic!("Unexpected statistic: {other:?}"),
        }

        assert_eq!(config.questions[1].prior.prior_sd, Some(1.5));
        assert_eq!(config.questions[2].statistic, StatisticSpec::standard_nps());
        assert!(!config.questions[2].methods.any());
    }

    #[test]
    fn test_defaults() {
        let settings = StudySettings::default();
        assert_eq!(settings.confidence_level, 0.95);
        assert_eq!(settings.bootstrap_iterations, 5000);
        assert!(settings.weight_variable.is_none());
    }

    #[test]
    fn test_run_level_validation() {
        let empty = StudyConfig::new(StudySettings::default(), Vec::new());
        assert!(matches!(empty.validate(), Err(Error::Configuration(_))));

        let question = QuestionSpec::new("Q1", StatisticSpec::Mean);
        let bad_level = StudyConfig::new(
            StudySettings {
                confidence_level: 1.0,
                ..Default::default()
            },
            vec![question.clone()],
        );
        assert!(bad_level.validate().is_err());

        let bad_deff = StudyConfig::new(
            StudySettings {
                assumed_design_effect: Some(0.5),
                ..Default::default()
            },
            vec![question],
        );
        assert!(bad_deff.validate().is_err());
    }

    #[test]
    fn test_unknown_statistic_type_is_rejected() {
        let json = r#"{"questions": [
            {"question_id": "Q1", "statistic": {"statistic_type": "median"}}
        ]}"#;
        assert!(matches!(
            StudyConfig::from_json_str(json),
            Err(Error::Configuration(_))
        ));
    }
}
