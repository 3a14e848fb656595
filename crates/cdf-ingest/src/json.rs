//! Nested-JSON flattening.
//!
//! Scalar fields flatten to dotted keys; arrays multiply rows. An object
//! with two sibling arrays yields the cartesian product, which matches how
//! nested results feeds repeat context over their leaves.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

use cdf_model::{LoadError, LoadResult};

use crate::table::RawTable;

pub fn read_json_table(path: &Path) -> LoadResult<RawTable> {
    let source = path.display().to_string();
    let text = fs::read_to_string(path)
        .map_err(|error| LoadError::file(&source, format!("cannot read json: {error}")))?;
    let value: Value = serde_json::from_str(&text)
        .map_err(|error| LoadError::file(&source, format!("malformed json: {error}")))?;

    let mut headers: Vec<String> = Vec::new();
    let records = flatten(&value, "", &mut headers);
    let rows = records
        .into_iter()
        .map(|record| {
            headers
                .iter()
                .map(|header| record.get(header).cloned().unwrap_or_default())
                .collect()
        })
        .collect();
    Ok(RawTable {
        headers,
        rows,
        ..RawTable::default()
    })
}

fn flatten(value: &Value, prefix: &str, headers: &mut Vec<String>) -> Vec<BTreeMap<String, String>> {
    match value {
        Value::Object(map) => {
            let mut rows: Vec<BTreeMap<String, String>> = vec![BTreeMap::new()];
            for (key, child) in map {
                let child_prefix = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                let child_rows = flatten(child, &child_prefix, headers);
                rows = cross(rows, child_rows);
            }
            rows
        }
        Value::Array(items) => {
            let mut rows = Vec::new();
            for item in items {
                rows.extend(flatten(item, prefix, headers));
            }
            // An empty array contributes nothing, not an empty row set.
            if rows.is_empty() {
                rows.push(BTreeMap::new());
            }
            rows
        }
        Value::Null => vec![BTreeMap::new()],
        scalar => {
            let rendered = match scalar {
                Value::String(text) => text.trim().to_string(),
                other => other.to_string(),
            };
            if !headers.iter().any(|header| header == prefix) {
                headers.push(prefix.to_string());
            }
            let mut record = BTreeMap::new();
            record.insert(prefix.to_string(), rendered);
            vec![record]
        }
    }
}

fn cross(
    left: Vec<BTreeMap<String, String>>,
    right: Vec<BTreeMap<String, String>>,
) -> Vec<BTreeMap<String, String>> {
    if right.len() == 1 {
        let single = &right[0];
        return left
            .into_iter()
            .map(|mut row| {
                row.extend(single.clone());
                row
            })
            .collect();
    }
    let mut out = Vec::with_capacity(left.len() * right.len());
    for base in &left {
        for extension in &right {
            let mut row = base.clone();
            row.extend(extension.clone());
            out.push(row);
        }
    }
    out
}
