//! Sectioned key-value parameter files.
//!
//! Munger and results-descriptor files share one shape: `[section]` headers
//! over `key=value` lines, `#` comments, values kept verbatim after the first
//! `=` (formulas regularly contain `=` and `,`). Typed recast happens on
//! demand through [`SectionReader`]; a failed recast is a categorized error,
//! never a panic.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use cdf_model::{ErrorCategory, LoadError, LoadResult};

/// Declared type for a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Str,
    StrList,
    Int,
    IntList,
}

/// A parameter value after recast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Str(String),
    StrList(Vec<String>),
    Int(i64),
    IntList(Vec<i64>),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str_list(&self) -> Option<&[String]> {
        match self {
            Self::StrList(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int_list(&self) -> Option<&[i64]> {
        match self {
            Self::IntList(values) => Some(values),
            _ => None,
        }
    }
}

/// All sections of one parameter file, in file order within each section.
#[derive(Debug, Clone, Default)]
pub struct ParamFile {
    pub sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl ParamFile {
    pub fn parse(text: &str) -> Self {
        let mut sections: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        let mut current: Option<String> = None;
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                let name = trimmed[1..trimmed.len() - 1].trim().to_string();
                sections.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }
            let Some(section) = current.as_ref() else {
                // Key-value line before any section header; ignored, as the
                // original reader does.
                continue;
            };
            if let Some((key, value)) = trimmed.split_once('=') {
                sections
                    .entry(section.clone())
                    .or_default()
                    .insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        Self { sections }
    }

    pub fn from_path(path: &Path, category: ErrorCategory) -> LoadResult<Self> {
        let text = fs::read_to_string(path).map_err(|error| {
            LoadError::new(
                category,
                path.display().to_string(),
                format!("cannot read parameter file: {error}"),
            )
        })?;
        Ok(Self::parse(&text))
    }

    /// Access a section, failing with the given category when absent.
    pub fn section<'a>(
        &'a self,
        name: &'a str,
        source: &'a str,
        category: ErrorCategory,
    ) -> LoadResult<SectionReader<'a>> {
        let entries = self.sections.get(name).ok_or_else(|| {
            LoadError::new(category, source, format!("missing section [{name}]"))
        })?;
        Ok(SectionReader {
            name,
            source,
            category,
            entries,
        })
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }
}

/// Typed access to one section's keys.
#[derive(Debug, Clone, Copy)]
pub struct SectionReader<'a> {
    name: &'a str,
    source: &'a str,
    category: ErrorCategory,
    entries: &'a BTreeMap<String, String>,
}

impl<'a> SectionReader<'a> {
    pub fn section_name(&self) -> &str {
        self.name
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn optional(&self, key: &str) -> Option<&'a str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn require(&self, key: &str) -> LoadResult<&'a str> {
        self.optional(key).ok_or_else(|| {
            LoadError::new(
                self.category,
                self.source,
                format!("section [{}] is missing required key {key}", self.name),
            )
        })
    }

    pub fn require_typed(&self, key: &str, ty: ParamType) -> LoadResult<ParamValue> {
        self.recast(key, self.require(key)?, ty)
    }

    pub fn optional_typed(&self, key: &str, ty: ParamType) -> LoadResult<Option<ParamValue>> {
        match self.optional(key) {
            Some(raw) => Ok(Some(self.recast(key, raw, ty)?)),
            None => Ok(None),
        }
    }

    fn recast(&self, key: &str, raw: &str, ty: ParamType) -> LoadResult<ParamValue> {
        match ty {
            ParamType::Str => Ok(ParamValue::Str(raw.to_string())),
            ParamType::StrList => Ok(ParamValue::StrList(split_list(raw))),
            ParamType::Int => raw.trim().parse::<i64>().map(ParamValue::Int).map_err(|_| {
                LoadError::new(
                    self.category,
                    self.source,
                    format!("key {key} in [{}] is not an integer: {raw}", self.name),
                )
            }),
            ParamType::IntList => {
                let mut values = Vec::new();
                for part in split_list(raw) {
                    let value = part.parse::<i64>().map_err(|_| {
                        LoadError::new(
                            self.category,
                            self.source,
                            format!(
                                "key {key} in [{}] has a non-integer entry: {part}",
                                self.name
                            ),
                        )
                    })?;
                    values.push(value);
                }
                Ok(ParamValue::IntList(values))
            }
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(String::from)
        .collect()
}
