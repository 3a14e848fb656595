use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of a load-time problem, matching the parameter surface it
/// originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Malformed or incomplete parameter file.
    Ini,
    /// Malformed formula or inconsistent munger parameters.
    Munger,
    /// Dictionary missing entries needed to resolve an element.
    Jurisdiction,
    /// Source file unreadable, unparseable, or empty.
    File,
    /// Unexpected internal failure caught at a stage boundary.
    System,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Ini => "ini",
            Self::Munger => "munger",
            Self::Jurisdiction => "jurisdiction",
            Self::File => "file",
            Self::System => "system",
        };
        f.write_str(label)
    }
}

/// A fatal, categorized load error. Warnings travel separately through
/// [`crate::Diagnostics`].
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{category} error [{key}]: {message}")]
pub struct LoadError {
    pub category: ErrorCategory,
    /// The file, munger, or element the error is reported against.
    pub key: String,
    pub message: String,
}

impl LoadError {
    pub fn new(
        category: ErrorCategory,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn ini(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Ini, key, message)
    }

    pub fn munger(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Munger, key, message)
    }

    pub fn jurisdiction(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Jurisdiction, key, message)
    }

    pub fn file(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::File, key, message)
    }

    pub fn system(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::System, key, message)
    }
}

pub type LoadResult<T> = std::result::Result<T, LoadError>;
