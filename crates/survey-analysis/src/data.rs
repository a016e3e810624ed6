//! Survey responses and the tabular data collaborator

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use survey_core::{Error, Result};

/// One raw response cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseValue {
    Number(f64),
    Text(String),
    Missing,
}

impl ResponseValue {
    /// Missing marker, NaN, or blank text
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Missing => true,
            Self::Number(x) => x.is_nan(),
            Self::Text(s) => s.trim().is_empty(),
        }
    }

    /// Numeric value of a number cell, without parsing text
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(x) if !x.is_nan() => Some(*x),
            _ => None,
        }
    }

    /// Numeric value, parsing text cells
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Self::Number(x) if !x.is_nan() => Some(*x),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|x| !x.is_nan()),
            _ => None,
        }
    }

    /// Canonical form for category matching
    ///
    /// Numeric text becomes a number and other text is trimmed, so `"1"`, `" 1 "`
    /// and `1.0` all match the same category.
    pub fn normalized(&self) -> Self {
        if self.is_missing() {
            return Self::Missing;
        }
        match self.to_number() {
            Some(x) => Self::Number(x),
            None => match self {
                Self::Text(s) => Self::Text(s.trim().to_string()),
                other => other.clone(),
            },
        }
    }
}

impl From<f64> for ResponseValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ResponseValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ResponseValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Option<f64>> for ResponseValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Missing, Self::Number)
    }
}

impl fmt::Display for ResponseValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::Missing => f.write_str("NA"),
        }
    }
}

/// Column lookup contract the analysis needs from survey data
pub trait SurveyData {
    /// Whether a column with this name exists
    fn column_exists(&self, name: &str) -> bool;

    /// Values of a column, one per respondent
    fn get_column(&self, name: &str) -> Option<&[ResponseValue]>;

    /// Number of respondents (rows)
    fn n_respondents(&self) -> usize;
}

/// In-memory column store
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "BTreeMap<String, Vec<ResponseValue>>")]
pub struct SurveyTable {
    columns: BTreeMap<String, Vec<ResponseValue>>,
    n_rows: usize,
}

impl SurveyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column; every column must have the same length
    pub fn with_column<V>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<Self>
    where
        V: Into<ResponseValue>,
    {
        self.insert_column(name, values.into_iter().map(Into::into).collect())?;
        Ok(self)
    }

    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<ResponseValue>,
    ) -> Result<()> {
        let name = name.into();
        if !self.columns.is_empty() && values.len() != self.n_rows {
            return Err(Error::size_mismatch(
                self.n_rows,
                values.len(),
                &format!("column '{name}'"),
            ));
        }
        self.n_rows = values.len();
        self.columns.insert(name, values);
        Ok(())
    }

    /// Parse a JSON object mapping column names to value arrays
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::InvalidInput(format!("Invalid survey data: {e}")))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}

impl TryFrom<BTreeMap<String, Vec<ResponseValue>>> for SurveyTable {
    type Error = Error;

    fn try_from(columns: BTreeMap<String, Vec<ResponseValue>>) -> Result<Self> {
        let mut table = Self::new();
        for (name, values) in columns {
            table.insert_column(name, values)?;
        }
        Ok(table)
    }
}

impl SurveyData for SurveyTable {
    fn column_exists(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    fn get_column(&self, name: &str) -> Option<&[ResponseValue]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    fn n_respondents(&self) -> usize {
        self.n_rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_detection() {
        assert!(ResponseValue::Missing.is_missing());
        assert!(ResponseValue::Number(f64::NAN).is_missing());
        assert!(ResponseValue::from("  ").is_missing());
        assert!(!ResponseValue::from("no").is_missing());
        assert!(!ResponseValue::Number(0.0).is_missing());
    }

    #[test]
    fn test_normalized_matching() {
        assert_eq!(ResponseValue::from(" 3 ").normalized(), ResponseValue::Number(3.0));
        assert_eq!(ResponseValue::from(" Yes").normalized(), ResponseValue::from("Yes"));
        assert_eq!(ResponseValue::from("").normalized(), ResponseValue::Missing);
    }

    #[test]
    fn test_table_columns() {
        let table = SurveyTable::new()
            .with_column("Q1", [1.0, 2.0, 3.0])
            .unwrap()
            .with_column("Q2", ["a", "b", "c"])
            .unwrap();

        assert!(table.column_exists("Q1"));
        assert!(!table.column_exists("Q3"));
        assert_eq!(table.n_respondents(), 3);
        assert_eq!(table.get_column("Q2").unwrap()[1], ResponseValue::from("b"));
    }

    #[test]
    fn test_table_rejects_ragged_columns() {
        let err = SurveyTable::new()
            .with_column("Q1", [1.0, 2.0])
            .unwrap()
            .with_column("Q2", [1.0])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_table_from_json() {
        let json = r#"{"Q1": [1, "2", null], "weight": [1.0, 0.5, 2]}"#;
        let table = SurveyTable::from_json_str(json).unwrap();
        assert_eq!(table.n_respondents(), 3);
        let q1 = table.get_column("Q1").unwrap();
        assert_eq!(q1[0], ResponseValue::Number(1.0));
        assert_eq!(q1[1], ResponseValue::from("2"));
        assert!(q1[2].is_missing());

        assert!(SurveyTable::from_json_str(r#"{"Q1": [1, 2], "Q2": [1]}"#).is_err());
    }
}
