//! Tabular reading of raw results files.
//!
//! One reader per munger `file_type`, all converging on [`RawTable`]:
//! flat text and Excel go through grid assembly (header geometry,
//! multi-block extraction, constant rows); XML and nested JSON flatten to
//! keyed columns directly.

pub mod blocks;
pub mod excel;
pub mod flat_text;
pub mod grid;
pub mod json;
pub mod lookup;
pub mod table;
pub mod xml;

use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;

use cdf_model::{Diagnostics, FileType, LoadError, LoadResult};
use cdf_params::MungerConfig;

pub use lookup::{LookupTable, read_lookup};
pub use table::{RawTable, normalize_cell, normalize_header, synthesized_headers};

/// Name given to the single logical sheet of non-workbook sources.
pub const DEFAULT_SHEET: &str = "results";

/// Read a results file into one raw table per logical sheet, per the
/// munger's file type and header geometry. Empty sheets are dropped with a
/// warning; a file yielding no tables at all is a fatal file error.
pub fn read_source(
    path: &Path,
    munger: &MungerConfig,
    diags: &mut Diagnostics,
) -> LoadResult<BTreeMap<String, RawTable>> {
    let source = path.display().to_string();
    let mut tables = BTreeMap::new();
    match munger.file_type {
        FileType::FlatText => {
            let cells = flat_text::read_flat_text_grid(path, munger, diags)?;
            for (name, table) in grid::assemble_tables(DEFAULT_SHEET, &cells, munger, diags) {
                tables.insert(name, table);
            }
        }
        FileType::Excel => {
            for (sheet, cells) in excel::read_excel_grids(path, munger, diags)? {
                for (name, table) in grid::assemble_tables(&sheet, &cells, munger, diags) {
                    tables.insert(name, table);
                }
            }
        }
        FileType::Xml => {
            let table = xml::read_xml_table(path)?;
            if !table.is_empty() {
                tables.insert(DEFAULT_SHEET.to_string(), table);
            }
        }
        FileType::JsonNested => {
            let table = json::read_json_table(path)?;
            if !table.is_empty() {
                tables.insert(DEFAULT_SHEET.to_string(), table);
            }
        }
    }
    if tables.is_empty() {
        return Err(LoadError::file(
            &source,
            "no sheet produced any data rows",
        ));
    }
    let row_total: usize = tables.values().map(|table| table.rows.len()).sum();
    info!(source = %source, sheets = tables.len(), rows = row_total, "read results file");
    Ok(tables)
}
