//! Accumulated, categorized diagnostics for a load.
//!
//! Every pipeline stage reports problems through an explicit [`Diagnostics`]
//! value owned by the caller. Sibling stages produce their own accumulators
//! which are merged, so no stage ever sees another stage's mutable state.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCategory, LoadError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Fatal,
    Warning,
}

/// One categorized problem record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub category: ErrorCategory,
    pub severity: Severity,
    /// The file, munger, or element the record is reported against.
    pub key: String,
    pub message: String,
}

impl From<LoadError> for Diagnostic {
    fn from(error: LoadError) -> Self {
        Self {
            category: error.category,
            severity: Severity::Fatal,
            key: error.key,
            message: error.message,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: Diagnostic) {
        self.records.push(record);
    }

    /// Record a non-fatal, categorized warning.
    pub fn warn(
        &mut self,
        category: ErrorCategory,
        key: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.records.push(Diagnostic {
            category,
            severity: Severity::Warning,
            key: key.into(),
            message: message.into(),
        });
    }

    /// Record a fatal error absorbed by the caller (e.g., one file of a batch).
    pub fn fatal(&mut self, error: LoadError) {
        self.records.push(error.into());
    }

    /// Append all of `other`'s records, consuming it.
    pub fn merge(&mut self, other: Diagnostics) {
        self.records.extend(other.records);
    }

    pub fn records(&self) -> &[Diagnostic] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records
            .iter()
            .filter(|record| record.severity == Severity::Warning)
    }

    pub fn fatals(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records
            .iter()
            .filter(|record| record.severity == Severity::Fatal)
    }

    pub fn has_fatal(&self) -> bool {
        self.fatals().next().is_some()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_preserves_order_and_counts() {
        let mut left = Diagnostics::new();
        left.warn(ErrorCategory::Munger, "m1", "bad formula");
        let mut right = Diagnostics::new();
        right.fatal(LoadError::file("results.txt", "empty file"));
        right.warn(ErrorCategory::Jurisdiction, "Candidate", "unmatched: X");
        left.merge(right);
        assert_eq!(left.records().len(), 3);
        assert_eq!(left.warning_count(), 2);
        assert!(left.has_fatal());
        assert_eq!(left.records()[1].key, "results.txt");
    }

    #[test]
    fn load_error_converts_to_fatal_record() {
        let record: Diagnostic = LoadError::ini("run_time.ini", "missing key munger_list").into();
        assert_eq!(record.severity, Severity::Fatal);
        assert_eq!(record.category, ErrorCategory::Ini);
    }
}
