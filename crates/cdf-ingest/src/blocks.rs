//! Multi-block sheet handling.
//!
//! Some sources stack several tables on one sheet, separated by caption or
//! blank rows. Rows are classified as count-bearing, blank, or text; a block
//! is a run of rows ending at a blank row or at a caption row that follows
//! count rows.

/// Classification of one raw row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// All cells empty.
    Blank,
    /// At least one numeric token.
    Count,
    /// Non-empty, no numeric token: caption or header text.
    Text,
}

pub fn classify_row(row: &[String]) -> RowKind {
    let mut saw_value = false;
    for cell in row {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            continue;
        }
        saw_value = true;
        if is_numeric_token(trimmed) {
            return RowKind::Count;
        }
    }
    if saw_value { RowKind::Text } else { RowKind::Blank }
}

/// A numeric token, allowing thousands separators.
pub fn is_numeric_token(value: &str) -> bool {
    let stripped: String = value.chars().filter(|ch| *ch != ',').collect();
    !stripped.is_empty() && stripped.parse::<f64>().is_ok()
}

/// Partition rows into stacked blocks. A blank row always ends the current
/// block; a text row directly after count rows starts a new one. Returns at
/// most `max_blocks` blocks when set.
pub fn partition_blocks(
    rows: &[Vec<String>],
    max_blocks: Option<usize>,
) -> Vec<Vec<Vec<String>>> {
    let mut blocks: Vec<Vec<Vec<String>>> = Vec::new();
    let mut current: Vec<Vec<String>> = Vec::new();
    let mut current_has_counts = false;

    for row in rows {
        if let Some(cap) = max_blocks
            && blocks.len() >= cap
        {
            break;
        }
        match classify_row(row) {
            RowKind::Blank => {
                if !current.is_empty() {
                    blocks.push(std::mem::take(&mut current));
                    current_has_counts = false;
                }
            }
            RowKind::Text => {
                if current_has_counts {
                    blocks.push(std::mem::take(&mut current));
                    current_has_counts = false;
                }
                current.push(row.clone());
            }
            RowKind::Count => {
                current_has_counts = true;
                current.push(row.clone());
            }
        }
    }
    if !current.is_empty() && max_blocks.is_none_or(|cap| blocks.len() < cap) {
        blocks.push(current);
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| (*cell).to_string()).collect()
    }

    #[test]
    fn classifies_rows() {
        assert_eq!(classify_row(&row(&["", "", ""])), RowKind::Blank);
        assert_eq!(classify_row(&row(&["Precinct 4", "1,204"])), RowKind::Count);
        assert_eq!(
            classify_row(&row(&["Governor - Rep Primary", ""])),
            RowKind::Text
        );
    }

    #[test]
    fn splits_on_blank_and_caption_rows() {
        let rows = vec![
            row(&["Governor", ""]),
            row(&["Precinct", "Votes"]),
            row(&["P1", "10"]),
            row(&["P2", "20"]),
            row(&["", ""]),
            row(&["Senate", ""]),
            row(&["Precinct", "Votes"]),
            row(&["P1", "7"]),
        ];
        let blocks = partition_blocks(&rows, None);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].len(), 4);
        assert_eq!(blocks[1].len(), 3);
    }

    #[test]
    fn caption_after_counts_starts_new_block_without_blank() {
        let rows = vec![
            row(&["Governor", ""]),
            row(&["P1", "10"]),
            row(&["Senate", ""]),
            row(&["P1", "7"]),
        ];
        let blocks = partition_blocks(&rows, None);
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn block_cap_applies() {
        let rows = vec![
            row(&["A", "1"]),
            row(&["", ""]),
            row(&["B", "2"]),
            row(&["", ""]),
            row(&["C", "3"]),
        ];
        let blocks = partition_blocks(&rows, Some(2));
        assert_eq!(blocks.len(), 2);
    }
}
