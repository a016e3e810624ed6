//! Per-question cleaning and alignment of responses with weights

use crate::data::ResponseValue;

/// Design weights resolved once per run; `None` marks an unusable weight
pub type WeightColumn = Vec<Option<f64>>;

/// Resolve a raw weight column: missing, non-finite or non-positive weights
/// become `None`
pub fn resolve_weights(column: &[ResponseValue]) -> WeightColumn {
    column
        .iter()
        .map(|cell| cell.to_number().filter(|w| w.is_finite() && *w > 0.0))
        .collect()
}

/// Responses valid for one question, aligned with their weights
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedSample<T> {
    pub values: Vec<T>,
    /// Same length as `values` when present
    pub weights: Option<Vec<f64>>,
    /// Respondents dropped for a missing response or weight
    pub n_dropped: usize,
}

impl<T> CleanedSample<T> {
    /// Keep respondents with a response and, if weighted, a usable weight
    pub fn from_responses(
        responses: impl IntoIterator<Item = Option<T>>,
        weights: Option<&WeightColumn>,
    ) -> Self {
        let mut values = Vec::new();
        let mut kept_weights = weights.map(|_| Vec::new());
        let mut n_dropped = 0;

        for (i, response) in responses.into_iter().enumerate() {
            let weight = match weights {
                None => None,
                Some(column) => match column.get(i).copied().flatten() {
                    Some(w) => Some(w),
                    None => {
                        n_dropped += 1;
                        continue;
                    }
                },
            };
            let Some(value) = response else {
                n_dropped += 1;
                continue;
            };
            values.push(value);
            if let (Some(kept), Some(w)) = (kept_weights.as_mut(), weight) {
                kept.push(w);
            }
        }

        Self {
            values,
            weights: kept_weights,
            n_dropped,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    pub fn total_weight(&self) -> f64 {
        match &self.weights {
            Some(w) => w.iter().sum(),
            None => self.values.len() as f64,
        }
    }
}
