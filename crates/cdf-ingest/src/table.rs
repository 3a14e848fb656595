//! The raw table: rows × string columns as read from the source file,
//! before standardization.

use std::collections::BTreeMap;

/// One raw table extracted from a source file (one sheet, or one block of a
/// multi-block sheet).
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Count-column header rows, padded to table width, outermost first.
    /// Empty unless the munger declares `count_header_row_numbers`.
    pub count_header_rows: Vec<Vec<String>>,
    /// Per-sheet constants pulled from designated constant rows,
    /// keyed `constant_row_<n>`.
    pub constants: BTreeMap<String, String>,
}

impl RawTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// All values of one column, padded with empty strings for short rows.
    pub fn column_values(&self, index: usize) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.get(index).cloned().unwrap_or_default())
            .collect()
    }
}

pub fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let mut parts = trimmed.split_whitespace();
    let mut normalized = String::new();
    if let Some(first) = parts.next() {
        normalized.push_str(first);
        for part in parts {
            normalized.push(' ');
            normalized.push_str(part);
        }
    }
    normalized
}

pub fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

/// Synthesized column names for headerless data: `column_0, column_1, ...`.
pub fn synthesized_headers(width: usize) -> Vec<String> {
    (0..width).map(|idx| format!("column_{idx}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_normalization_collapses_whitespace() {
        assert_eq!(normalize_header("  Vote \t Count "), "Vote Count");
        assert_eq!(normalize_header("\u{feff}County"), "County");
    }

    #[test]
    fn synthesized_names() {
        assert_eq!(synthesized_headers(2), vec!["column_0", "column_1"]);
    }

    #[test]
    fn column_values_pad_short_rows() {
        let table = RawTable {
            headers: vec!["a".into(), "b".into()],
            rows: vec![vec!["1".into(), "2".into()], vec!["3".into()]],
            ..RawTable::default()
        };
        assert_eq!(table.column_values(1), vec!["2".to_string(), String::new()]);
    }
}
