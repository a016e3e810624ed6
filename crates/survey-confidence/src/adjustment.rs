//! Confidence level adjustment for many simultaneous questions

use serde::{Deserialize, Serialize};
use std::fmt;
use survey_core::{Error, Result};

/// Multiple comparison correction applied across the analysed questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultipleComparisonMethod {
    /// Family-wise coverage, `1 - α/m`
    Bonferroni,
    /// Holm step-down; for simultaneous intervals it reduces to Bonferroni
    Holm,
    /// Benjamini-Yekutieli false coverage-statement rate
    ///
    /// Every configured question is reported, so all `m` are selected and the
    /// level is left unchanged: choosing this method applies no adjustment.
    Fdr,
}

impl MultipleComparisonMethod {
    /// Whether the per-question level can differ from the nominal one
    pub fn narrows_level(&self) -> bool {
        !matches!(self, Self::Fdr)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bonferroni => "Bonferroni",
            Self::Holm => "Holm",
            Self::Fdr => "FDR",
        }
    }
}

impl fmt::Display for MultipleComparisonMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-question confidence level for `n_comparisons` simultaneous intervals
///
/// Bonferroni and Holm give `1 - α/m`. The FCR adjustment with every one of
/// the `m` questions selected is `1 - R·α/m` with `R = m`, i.e. unchanged.
pub fn adjusted_confidence_level(
    confidence_level: f64,
    n_comparisons: usize,
    method: MultipleComparisonMethod,
) -> Result<f64> {
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(Error::invalid_confidence_level(confidence_level));
    }
    if n_comparisons == 0 {
        return Err(Error::Configuration(
            "Multiple comparison adjustment needs at least one comparison".to_string(),
        ));
    }

    let alpha = 1.0 - confidence_level;
    let m = n_comparisons as f64;
    Ok(match method {
        MultipleComparisonMethod::Bonferroni | MultipleComparisonMethod::Holm => 1.0 - alpha / m,
        MultipleComparisonMethod::Fdr => confidence_level,
    })
}
