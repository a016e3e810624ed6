//! Warnings collected over one analysis run

use serde::Serialize;
use std::fmt;

/// Append-only, ordered list of human-readable warnings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RunWarnings(Vec<String>);

impl RunWarnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: impl Into<String>) {
        self.0.push(warning.into());
    }

    pub fn extend<I>(&mut self, warnings: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.0.extend(warnings.into_iter().map(Into::into));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl fmt::Display for RunWarnings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, warning) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "- {warning}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_is_preserved() {
        let mut warnings = RunWarnings::new();
        warnings.push("first");
        warnings.extend(vec!["second".to_string(), "third".to_string()]);
        assert_eq!(warnings.iter().collect::<Vec<_>>(), ["first", "second", "third"]);
        assert_eq!(warnings.to_string(), "- first\n- second\n- third");
    }
}
