//! Jurisdiction dictionary: raw identifier → internal CDF name, per element.
//!
//! `dictionary.txt` is tab-separated with columns `cdf_element`,
//! `cdf_internal_name`, `raw_identifier_value`. Many raw values may map to
//! one internal name; the reserved internal name
//! [`cdf_model::ROW_SHOULD_BE_DROPPED`] marks deliberate exclusions.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use csv::ReaderBuilder;
use tracing::debug;

use cdf_model::{CdfElement, Diagnostics, ErrorCategory, LoadError, LoadResult};

#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    by_element: BTreeMap<CdfElement, BTreeMap<String, String>>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        element: CdfElement,
        raw: impl Into<String>,
        internal: impl Into<String>,
    ) {
        self.by_element
            .entry(element)
            .or_default()
            .insert(raw.into(), internal.into());
    }

    /// All raw → internal entries for one element.
    pub fn entries(&self, element: CdfElement) -> Option<&BTreeMap<String, String>> {
        self.by_element.get(&element)
    }

    pub fn lookup(&self, element: CdfElement, raw: &str) -> Option<&str> {
        self.by_element
            .get(&element)?
            .get(raw)
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.by_element.values().all(BTreeMap::is_empty)
    }

    /// Read `dictionary.txt`. Rows with unknown `cdf_element` values and
    /// conflicting duplicate raw values degrade to warnings.
    pub fn from_path(path: &Path, diags: &mut Diagnostics) -> LoadResult<Self> {
        let source = path.display().to_string();
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_path(path)
            .map_err(|error| {
                LoadError::jurisdiction(&source, format!("cannot read dictionary: {error}"))
            })?;

        let headers = reader
            .headers()
            .map_err(|error| {
                LoadError::jurisdiction(&source, format!("cannot read dictionary header: {error}"))
            })?
            .clone();
        let index_of = |name: &str| headers.iter().position(|header| header.trim() == name);
        let (Some(element_idx), Some(internal_idx), Some(raw_idx)) = (
            index_of("cdf_element"),
            index_of("cdf_internal_name"),
            index_of("raw_identifier_value"),
        ) else {
            return Err(LoadError::jurisdiction(
                &source,
                "dictionary must have columns cdf_element, cdf_internal_name, raw_identifier_value",
            ));
        };

        let mut dictionary = Self::new();
        for (row_number, record) in reader.records().enumerate() {
            let record = record.map_err(|error| {
                LoadError::jurisdiction(
                    &source,
                    format!("unparseable dictionary row {}: {error}", row_number + 2),
                )
            })?;
            let field = |idx: usize| record.get(idx).unwrap_or("").trim();
            let raw_element = field(element_idx);
            if raw_element.is_empty() {
                continue;
            }
            let Ok(element) = CdfElement::from_str(raw_element) else {
                diags.warn(
                    ErrorCategory::Jurisdiction,
                    &source,
                    format!("ignoring row with unknown cdf_element {raw_element}"),
                );
                continue;
            };
            let internal = field(internal_idx);
            let raw = field(raw_idx);
            if raw.is_empty() || internal.is_empty() {
                continue;
            }
            let entries = dictionary.by_element.entry(element).or_default();
            if let Some(previous) = entries.get(raw)
                && previous != internal
            {
                diags.warn(
                    ErrorCategory::Jurisdiction,
                    &source,
                    format!(
                        "{element} raw value {raw} maps to both {previous} and {internal}; keeping {internal}"
                    ),
                );
            }
            entries.insert(raw.to_string(), internal.to_string());
        }
        debug!(
            source = %source,
            elements = dictionary.by_element.len(),
            "loaded jurisdiction dictionary"
        );
        Ok(dictionary)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write_dictionary(contents: &str) -> std::path::PathBuf {
        let dir = tempfile::tempdir().expect("temp dir").keep();
        let path = dir.join("dictionary.txt");
        fs::write(&path, contents).expect("write dictionary");
        path
    }

    #[test]
    fn loads_entries_per_element() {
        let path = write_dictionary(
            "cdf_element\tcdf_internal_name\traw_identifier_value\n\
             Candidate\tJoseph R. Biden\tBIDEN, JOSEPH R.\n\
             Candidate\trow should be dropped\tOver Votes\n\
             Party\tDemocratic Party\tDEM\n",
        );
        let mut diags = Diagnostics::new();
        let dictionary = Dictionary::from_path(&path, &mut diags).expect("dictionary");
        assert!(diags.is_empty());
        assert_eq!(
            dictionary.lookup(CdfElement::Candidate, "BIDEN, JOSEPH R."),
            Some("Joseph R. Biden")
        );
        assert_eq!(
            dictionary.lookup(CdfElement::Party, "DEM"),
            Some("Democratic Party")
        );
        assert_eq!(dictionary.lookup(CdfElement::Party, "REP"), None);
    }

    #[test]
    fn unknown_element_rows_warn_but_load_continues() {
        let path = write_dictionary(
            "cdf_element\tcdf_internal_name\traw_identifier_value\n\
             Precinct\tX\tY\n\
             Party\tGreen Party\tGRN\n",
        );
        let mut diags = Diagnostics::new();
        let dictionary = Dictionary::from_path(&path, &mut diags).expect("dictionary");
        assert_eq!(diags.warning_count(), 1);
        assert_eq!(
            dictionary.lookup(CdfElement::Party, "GRN"),
            Some("Green Party")
        );
    }

    #[test]
    fn missing_columns_are_fatal() {
        let path = write_dictionary("element\tname\tvalue\nParty\tX\tY\n");
        let mut diags = Diagnostics::new();
        let error = Dictionary::from_path(&path, &mut diags).expect_err("bad header");
        assert_eq!(error.category, ErrorCategory::Jurisdiction);
    }
}
