//! Reshaping a raw table into the standard count frame.
//!
//! Every count column is melted against the remaining columns: one output
//! row per (input row, count column), a single integer `Count` column, and
//! all other fields as `_SOURCE` strings. Count-column header text is kept
//! in `header_<i>` fields so formulas can pull candidate or vote-type names
//! out of the headers.

use polars::prelude::{DataFrame, NamedFrom, Series};
use tracing::debug;

use cdf_ingest::RawTable;
use cdf_model::{CountLocation, Diagnostics, ErrorCategory, LoadError, LoadResult};
use cdf_params::MungerConfig;

use crate::frame::{COUNT_COLUMN, CountFrame, SOURCE_SUFFIX};

pub fn standardize(
    sheet: &str,
    table: &RawTable,
    munger: &MungerConfig,
    diags: &mut Diagnostics,
) -> LoadResult<CountFrame> {
    let count_columns = count_column_indexes(table, munger)?;
    let noncount_columns: Vec<usize> = (0..table.headers.len())
        .filter(|idx| !count_columns.contains(idx))
        .collect();

    let header_fields = if table.count_header_rows.is_empty() {
        1
    } else {
        table.count_header_rows.len()
    };

    let out_rows = table.rows.len() * count_columns.len();
    let mut noncount_values: Vec<Vec<String>> =
        vec![Vec::with_capacity(out_rows); noncount_columns.len()];
    let mut header_values: Vec<Vec<String>> = vec![Vec::with_capacity(out_rows); header_fields];
    let mut counts: Vec<i64> = Vec::with_capacity(out_rows);
    let mut bad_tokens: Vec<String> = Vec::new();

    for row in &table.rows {
        for &count_idx in &count_columns {
            for (slot, &noncount_idx) in noncount_columns.iter().enumerate() {
                noncount_values[slot]
                    .push(row.get(noncount_idx).cloned().unwrap_or_default());
            }
            if table.count_header_rows.is_empty() {
                header_values[0].push(table.headers[count_idx].clone());
            } else {
                for (slot, header_row) in table.count_header_rows.iter().enumerate() {
                    header_values[slot]
                        .push(header_row.get(count_idx).cloned().unwrap_or_default());
                }
            }
            let raw = row.get(count_idx).map(String::as_str).unwrap_or("");
            match parse_count(raw, munger.thousands_separator) {
                Some(count) => counts.push(count),
                None => {
                    // Coerced to zero; the row stays so its identity columns
                    // still surface in the unmatched report.
                    if bad_tokens.len() < 5 {
                        bad_tokens.push(raw.to_string());
                    }
                    counts.push(0);
                }
            }
        }
    }
    if !bad_tokens.is_empty() {
        diags.warn(
            ErrorCategory::File,
            sheet,
            format!(
                "non-numeric count values coerced to 0 (examples: {})",
                bad_tokens.join(", ")
            ),
        );
    }

    let mut columns: Vec<Series> = Vec::new();
    let mut used_names: Vec<String> = Vec::new();
    for (slot, &noncount_idx) in noncount_columns.iter().enumerate() {
        let name = unique_name(&mut used_names, &table.headers[noncount_idx]);
        columns.push(Series::new(
            format!("{name}{SOURCE_SUFFIX}").as_str().into(),
            std::mem::take(&mut noncount_values[slot]),
        ));
    }
    for (slot, values) in header_values.iter_mut().enumerate() {
        columns.push(Series::new(
            format!("header_{slot}{SOURCE_SUFFIX}").as_str().into(),
            std::mem::take(values),
        ));
    }
    for (name, value) in &table.constants {
        columns.push(Series::new(
            format!("{name}{SOURCE_SUFFIX}").as_str().into(),
            vec![value.clone(); counts.len()],
        ));
    }
    columns.push(Series::new(COUNT_COLUMN.into(), counts));

    let data = DataFrame::new(columns.into_iter().map(Into::into).collect())
        .map_err(|error| LoadError::system(sheet, format!("cannot build count frame: {error}")))?;
    debug!(sheet, rows = data.height(), "standardized count frame");
    Ok(CountFrame { data })
}

fn count_column_indexes(table: &RawTable, munger: &MungerConfig) -> LoadResult<Vec<usize>> {
    match munger.count_location {
        CountLocation::ByNumber => {
            for &idx in &munger.count_column_numbers {
                if idx >= table.headers.len() {
                    return Err(LoadError::munger(
                        &munger.name,
                        format!(
                            "count_column_numbers names column {idx} but the table has {} columns",
                            table.headers.len()
                        ),
                    ));
                }
            }
            Ok(munger.count_column_numbers.clone())
        }
        CountLocation::ByName => {
            let mut indexes = Vec::new();
            for idx in 0..table.headers.len() {
                if column_matches_any(table, idx, &munger.count_fields_by_name) {
                    indexes.push(idx);
                }
            }
            if indexes.is_empty() {
                return Err(LoadError::munger(
                    &munger.name,
                    format!(
                        "no column matches count_fields_by_name ({})",
                        munger.count_fields_by_name.join(", ")
                    ),
                ));
            }
            Ok(indexes)
        }
    }
}

/// A column is a count column if its header, or any of its count-header-row
/// labels, matches one of the configured names.
fn column_matches_any(table: &RawTable, idx: usize, names: &[String]) -> bool {
    if names.iter().any(|name| name == &table.headers[idx]) {
        return true;
    }
    table.count_header_rows.iter().any(|row| {
        row.get(idx)
            .map(|label| names.iter().any(|name| name == label))
            .unwrap_or(false)
    })
}

fn unique_name(used: &mut Vec<String>, candidate: &str) -> String {
    let mut name = candidate.to_string();
    let mut suffix = 1;
    while used.contains(&name) {
        name = format!("{candidate}_{suffix}");
        suffix += 1;
    }
    used.push(name.clone());
    name
}

/// Parse one count token: thousands separators stripped, blanks are zero,
/// whole floats accepted.
pub fn parse_count(raw: &str, thousands_separator: Option<char>) -> Option<i64> {
    let mut token = raw.trim().to_string();
    if let Some(sep) = thousands_separator {
        token.retain(|ch| ch != sep);
    }
    if token.is_empty() {
        return Some(0);
    }
    if let Ok(count) = token.parse::<i64>() {
        return Some(count);
    }
    match token.parse::<f64>() {
        Ok(value) if value.fract() == 0.0 => Some(value as i64),
        _ => None,
    }
}
