//! Auxiliary lookup tables for `<field from key>` formula chains.

use std::collections::BTreeMap;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use cdf_model::{Diagnostics, ErrorCategory, LoadError, LoadResult};
use cdf_params::{LookupSpec, MungerConfig};

use crate::table::{RawTable, normalize_cell, normalize_header};

/// A lookup table keyed and deduplicated on its `lookup_id` column.
#[derive(Debug, Clone)]
pub struct LookupTable {
    pub key_column: String,
    pub headers: Vec<String>,
    pub rows_by_key: BTreeMap<String, Vec<String>>,
}

impl LookupTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn value(&self, key: &str, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows_by_key
            .get(key)?
            .get(idx)
            .map(String::as_str)
    }
}

/// Load the lookup table for one `[<field> lookup]` section. With no
/// `source_file` the main results table itself is the source; otherwise the
/// named file is read as delimited text with a single header row, resolved
/// relative to the results file.
pub fn read_lookup(
    field: &str,
    spec: &LookupSpec,
    results_path: &Path,
    main_table: &RawTable,
    munger: &MungerConfig,
    diags: &mut Diagnostics,
) -> LoadResult<LookupTable> {
    let (headers, rows) = match spec.source_file.as_deref() {
        None => (main_table.headers.clone(), main_table.rows.clone()),
        Some(relative) => {
            let path = results_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(relative);
            read_lookup_file(&path, munger)?
        }
    };

    let Some(key_idx) = headers.iter().position(|header| header == &spec.lookup_id) else {
        return Err(LoadError::munger(
            format!("{field} lookup"),
            format!("lookup table has no column {}", spec.lookup_id),
        ));
    };

    let mut rows_by_key = BTreeMap::new();
    for row in rows {
        let key = row.get(key_idx).cloned().unwrap_or_default();
        if key.is_empty() {
            continue;
        }
        if rows_by_key.contains_key(&key) {
            diags.warn(
                ErrorCategory::Munger,
                format!("{field} lookup"),
                format!("duplicate lookup key {key}; keeping the first row"),
            );
            continue;
        }
        rows_by_key.insert(key, row);
    }
    debug!(field, keys = rows_by_key.len(), "loaded lookup table");
    Ok(LookupTable {
        key_column: spec.lookup_id.clone(),
        headers,
        rows_by_key,
    })
}

fn read_lookup_file(
    path: &Path,
    munger: &MungerConfig,
) -> LoadResult<(Vec<String>, Vec<Vec<String>>)> {
    let source = path.display().to_string();
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(munger.delimiter)
        .flexible(true)
        .from_path(path)
        .map_err(|error| LoadError::file(&source, format!("cannot read lookup file: {error}")))?;
    let mut headers = Vec::new();
    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|error| {
            LoadError::file(&source, format!("unparseable lookup row: {error}"))
        })?;
        if index == 0 {
            headers = record.iter().map(normalize_header).collect();
        } else {
            rows.push(record.iter().map(normalize_cell).collect());
        }
    }
    Ok((headers, rows))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use cdf_params::ParamFile;

    use super::*;

    fn munger() -> MungerConfig {
        let text = "[format]\nfile_type=flat_text\ncount_location=by_number\ncount_column_numbers=1\n\n\
                    [munge formulas]\nReportingUnit=<column_0>\nCandidateContest=<column_0>\nCandidate=<column_0>\nCountItemType=<column_0>\n";
        MungerConfig::from_param_file("test", &ParamFile::parse(text)).expect("munger")
    }

    #[test]
    fn loads_and_dedupes_on_key() {
        let dir = tempfile::tempdir().expect("temp dir").keep();
        let results = dir.join("results.txt");
        fs::write(&results, "x\n").expect("write results");
        fs::write(
            dir.join("party_codes.csv"),
            "PartyCode,PartyName\nDEM,Democratic Party\nREP,Republican Party\nDEM,Democrat\n",
        )
        .expect("write lookup");

        let spec = LookupSpec {
            source_file: Some("party_codes.csv".to_string()),
            lookup_id: "PartyCode".to_string(),
        };
        let mut diags = Diagnostics::new();
        let lookup = read_lookup(
            "Party",
            &spec,
            &results,
            &RawTable::default(),
            &munger(),
            &mut diags,
        )
        .expect("lookup");
        assert_eq!(lookup.value("DEM", "PartyName"), Some("Democratic Party"));
        assert_eq!(lookup.value("REP", "PartyName"), Some("Republican Party"));
        assert_eq!(diags.warning_count(), 1);
    }

    #[test]
    fn missing_key_column_is_a_munger_error() {
        let dir = tempfile::tempdir().expect("temp dir").keep();
        let results = dir.join("results.txt");
        fs::write(&results, "x\n").expect("write results");
        fs::write(dir.join("codes.csv"), "A,B\n1,2\n").expect("write lookup");
        let spec = LookupSpec {
            source_file: Some("codes.csv".to_string()),
            lookup_id: "Code".to_string(),
        };
        let mut diags = Diagnostics::new();
        let error = read_lookup(
            "Party",
            &spec,
            &results,
            &RawTable::default(),
            &munger(),
            &mut diags,
        )
        .expect_err("missing key column");
        assert_eq!(error.category, ErrorCategory::Munger);
    }
}
