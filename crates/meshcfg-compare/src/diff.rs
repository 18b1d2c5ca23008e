//! Difference records produced by configuration comparison

use serde::{Deserialize, Serialize};

use crate::value::ConfigValue;

/// Maximum number of differences listed by [`diff_summary`]
pub const SUMMARY_LIMIT: usize = 10;

/// Kind of configuration difference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    /// Expected field absent from actual
    Missing,
    /// Field present on both sides with different values
    Mismatch,
    /// Expected a mapping or list, actual has another shape
    TypeMismatch,
    /// Field present only in actual (strict comparisons only)
    Extra,
}

/// One difference between expected and actual configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDiff {
    /// Dot-separated field path
    pub field: String,
    /// Expected value, `None` for extra fields
    pub expected: Option<ConfigValue>,
    /// Actual value, `None` for missing fields
    pub actual: Option<ConfigValue>,
    /// Difference kind
    pub kind: DiffKind,
}

impl ConfigDiff {
    /// Expected field not present in actual
    #[must_use]
    pub fn missing(field: impl Into<String>, expected: ConfigValue) -> Self {
        Self {
            field: field.into(),
            expected: Some(expected),
            actual: None,
            kind: DiffKind::Missing,
        }
    }

    /// Values differ
    #[must_use]
    pub fn mismatch(field: impl Into<String>, expected: ConfigValue, actual: ConfigValue) -> Self {
        Self {
            field: field.into(),
            expected: Some(expected),
            actual: Some(actual),
            kind: DiffKind::Mismatch,
        }
    }

    /// Shapes differ
    #[must_use]
    pub fn type_mismatch(
        field: impl Into<String>,
        expected: ConfigValue,
        actual: ConfigValue,
    ) -> Self {
        Self {
            field: field.into(),
            expected: Some(expected),
            actual: Some(actual),
            kind: DiffKind::TypeMismatch,
        }
    }

    /// Field only present in actual
    #[must_use]
    pub fn extra(field: impl Into<String>, actual: ConfigValue) -> Self {
        Self {
            field: field.into(),
            expected: None,
            actual: Some(actual),
            kind: DiffKind::Extra,
        }
    }

    fn describe(&self) -> String {
        let expected = self.expected.as_ref().unwrap_or(&ConfigValue::Null);
        let actual = self.actual.as_ref().unwrap_or(&ConfigValue::Null);
        match self.kind {
            DiffKind::Missing => format!("{}: missing (expected: {expected})", self.field),
            DiffKind::Extra => format!("{}: extra field (value: {actual})", self.field),
            DiffKind::TypeMismatch => format!(
                "{}: type mismatch (expected: {}, actual: {})",
                self.field,
                expected.type_name(),
                actual.type_name()
            ),
            DiffKind::Mismatch => format!("{}: {expected} != {actual}", self.field),
        }
    }
}

/// Human-readable summary of a diff list
///
/// Lists at most [`SUMMARY_LIMIT`] entries.
#[must_use]
pub fn diff_summary(diffs: &[ConfigDiff]) -> String {
    if diffs.is_empty() {
        return "Configurations are identical".to_string();
    }

    let mut lines = vec![format!("{} difference(s) found:", diffs.len())];
    lines.extend(
        diffs
            .iter()
            .take(SUMMARY_LIMIT)
            .map(|d| format!("  - {}", d.describe())),
    );
    if diffs.len() > SUMMARY_LIMIT {
        lines.push(format!("  ... and {} more", diffs.len() - SUMMARY_LIMIT));
    }
    lines.join("\n")
}
