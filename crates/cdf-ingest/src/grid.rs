//! Assembly of raw cell grids into [`RawTable`]s according to munger header
//! geometry: skip rows, multi-block partitioning, constant-row extraction,
//! and header determination.

use std::collections::BTreeMap;

use cdf_model::{Diagnostics, ErrorCategory};
use cdf_params::MungerConfig;

use crate::blocks::partition_blocks;
use crate::table::{RawTable, normalize_cell, normalize_header, synthesized_headers};

/// Turn one sheet's cell grid into one or more raw tables. Multi-block
/// sheets yield one table per block, named `<sheet>_block_<i>`.
pub fn assemble_tables(
    sheet_name: &str,
    grid: &[Vec<String>],
    munger: &MungerConfig,
    diags: &mut Diagnostics,
) -> Vec<(String, RawTable)> {
    let body = if munger.rows_to_skip < grid.len() {
        &grid[munger.rows_to_skip..]
    } else {
        &[]
    };

    let blocks: Vec<Vec<Vec<String>>> = if munger.multi_block {
        partition_blocks(body, munger.max_blocks)
    } else {
        vec![body.to_vec()]
    };
    let multi = blocks.len() > 1;

    let mut tables = Vec::new();
    for (index, block) in blocks.iter().enumerate() {
        let name = if multi {
            format!("{sheet_name}_block_{index}")
        } else {
            sheet_name.to_string()
        };
        let table = assemble_block(block, munger);
        if table.is_empty() {
            diags.warn(
                ErrorCategory::File,
                &name,
                "sheet or block produced no data rows; dropped",
            );
            continue;
        }
        tables.push((name, table));
    }
    tables
}

fn assemble_block(block: &[Vec<String>], munger: &MungerConfig) -> RawTable {
    // The header zone covers every designated header and constant row; data
    // starts on the first row past it.
    let mut zone_end = 0usize;
    if !munger.all_rows_data {
        if let Some(row) = munger.noncount_header_row {
            zone_end = zone_end.max(row + 1);
        }
        for row in &munger.count_header_row_numbers {
            zone_end = zone_end.max(row + 1);
        }
    }
    for row in &munger.constant_rows {
        zone_end = zone_end.max(row + 1);
    }
    if zone_end > block.len() {
        return RawTable::default();
    }

    let data: Vec<Vec<String>> = block[zone_end..]
        .iter()
        .map(|row| row.iter().map(|cell| normalize_cell(cell)).collect())
        .collect();

    let width = data
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or(0)
        .max(match munger.noncount_header_row {
            Some(row) => block.get(row).map(Vec::len).unwrap_or(0),
            None => 0,
        });

    let mut headers = match munger.noncount_header_row {
        Some(row) if !munger.all_rows_data => {
            let mut headers: Vec<String> = block
                .get(row)
                .map(|cells| cells.iter().map(|cell| normalize_header(cell)).collect())
                .unwrap_or_default();
            // Unnamed columns still need stable names for by-number access.
            for (idx, header) in headers.iter_mut().enumerate() {
                if header.is_empty() {
                    *header = format!("column_{idx}");
                }
            }
            headers
        }
        _ => synthesized_headers(width),
    };
    while headers.len() < width {
        headers.push(format!("column_{}", headers.len()));
    }

    let count_header_rows = munger
        .count_header_row_numbers
        .iter()
        .map(|row| {
            let mut cells: Vec<String> = block
                .get(*row)
                .map(|cells| cells.iter().map(|cell| normalize_header(cell)).collect())
                .unwrap_or_default();
            cells.resize(width, String::new());
            forward_fill(&mut cells);
            cells
        })
        .collect();

    let mut constants = BTreeMap::new();
    for (slot, row) in munger.constant_rows.iter().enumerate() {
        let value = block
            .get(*row)
            .and_then(|cells| cells.iter().find(|cell| !cell.trim().is_empty()))
            .map(|cell| normalize_cell(cell))
            .unwrap_or_default();
        constants.insert(format!("constant_row_{slot}"), value);
    }

    let rows = data
        .into_iter()
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .map(|mut row| {
            row.resize(width, String::new());
            row
        })
        .collect();

    RawTable {
        headers,
        rows,
        count_header_rows,
        constants,
    }
}

/// Merged-cell style fill: blank header cells inherit the value to their
/// left.
fn forward_fill(cells: &mut [String]) {
    let mut last = String::new();
    for cell in cells.iter_mut() {
        if cell.is_empty() {
            *cell = last.clone();
        } else {
            last = cell.clone();
        }
    }
}
