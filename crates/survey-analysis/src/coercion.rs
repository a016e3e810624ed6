//! Numeric coercion policy for mean and NPS questions
//!
//! A column holding text is accepted as numeric only if at least
//! [`MIN_CONVERTED_VALUES`] cells end up numeric and they make up at least
//! [`MIN_SUCCESS_RATE`] of the non-missing cells. Cells that fail to parse
//! become missing.

use crate::data::ResponseValue;

/// Fewest numeric cells a coerced column must contain
pub const MIN_CONVERTED_VALUES: usize = 10;

/// Smallest share of non-missing cells that must be numeric
pub const MIN_SUCCESS_RATE: f64 = 0.8;

/// A response column as numbers; `None` marks a missing or unparseable cell
#[derive(Debug, Clone, PartialEq)]
pub struct NumericValues {
    pub values: Vec<Option<f64>>,
    /// Text cells that parsed as numbers
    pub n_converted: usize,
    /// Non-blank text cells that did not parse
    pub n_failed: usize,
}

impl NumericValues {
    /// Whether any text had to be parsed
    pub fn was_coerced(&self) -> bool {
        self.n_converted > 0 || self.n_failed > 0
    }
}

/// Interpret a response column as numeric
///
/// Columns without text cells are returned as-is. Otherwise the thresholds
/// above decide, and `None` means the column is not usable as numeric.
pub fn try_numeric_coercion(values: &[ResponseValue]) -> Option<NumericValues> {
    let mut n_numeric = 0usize;
    let mut n_converted = 0usize;
    let mut n_failed = 0usize;

    let coerced: Vec<Option<f64>> = values
        .iter()
        .map(|value| {
            if value.is_missing() {
                return None;
            }
            match value {
                ResponseValue::Number(x) => {
                    n_numeric += 1;
                    Some(*x)
                }
                ResponseValue::Text(_) => match value.to_number() {
                    Some(x) => {
                        n_converted += 1;
                        Some(x)
                    }
                    None => {
                        n_failed += 1;
                        None
                    }
                },
                ResponseValue::Missing => None,
            }
        })
        .collect();

    let result = NumericValues {
        values: coerced,
        n_converted,
        n_failed,
    };
    if !result.was_coerced() {
        return Some(result);
    }

    let successes = n_numeric + n_converted;
    let attempted = successes + n_failed;
    let success_rate = successes as f64 / attempted as f64;
    (successes >= MIN_CONVERTED_VALUES && success_rate >= MIN_SUCCESS_RATE).then_some(result)
}
