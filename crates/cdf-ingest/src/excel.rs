//! Excel workbook reading via calamine.

use std::path::Path;

use calamine::{DataType, Reader, open_workbook_auto};
use tracing::debug;

use cdf_model::{Diagnostics, ErrorCategory, LoadError, LoadResult};
use cdf_params::MungerConfig;

/// Read the selected sheets of a workbook into cell grids, in workbook
/// order.
pub fn read_excel_grids(
    path: &Path,
    munger: &MungerConfig,
    diags: &mut Diagnostics,
) -> LoadResult<Vec<(String, Vec<Vec<String>>)>> {
    let source = path.display().to_string();
    let mut workbook = open_workbook_auto(path)
        .map_err(|error| LoadError::file(&source, format!("cannot open workbook: {error}")))?;
    let sheet_names = workbook.sheet_names().to_vec();

    for wanted in &munger.sheets_to_read_names {
        if !sheet_names.iter().any(|name| name == wanted) {
            diags.warn(
                ErrorCategory::File,
                &source,
                format!("workbook has no sheet named {wanted}"),
            );
        }
    }

    let mut grids = Vec::new();
    for (index, name) in sheet_names.iter().enumerate() {
        if !sheet_selected(munger, index, name) {
            continue;
        }
        let range = match workbook.worksheet_range(name) {
            Some(Ok(range)) => range,
            Some(Err(error)) => {
                return Err(LoadError::file(
                    &source,
                    format!("cannot read sheet {name}: {error}"),
                ));
            }
            None => continue,
        };
        let grid: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();
        debug!(sheet = %name, rows = grid.len(), "read workbook sheet");
        grids.push((name.clone(), grid));
    }
    Ok(grids)
}

fn sheet_selected(munger: &MungerConfig, index: usize, name: &str) -> bool {
    if !munger.sheets_to_read_names.is_empty() {
        return munger.sheets_to_read_names.iter().any(|wanted| wanted == name);
    }
    if !munger.sheets_to_read_numbers.is_empty() {
        return munger.sheets_to_read_numbers.contains(&index);
    }
    !munger.sheets_to_skip_names.iter().any(|skip| skip == name)
}

fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::Empty => String::new(),
        DataType::String(value) => value.trim().to_string(),
        DataType::Int(value) => value.to_string(),
        DataType::Float(value) | DataType::DateTime(value) => format_numeric(*value),
        DataType::Bool(value) => {
            if *value {
                "1".to_string()
            } else {
                "0".to_string()
            }
        }
        DataType::Error(_) => String::new(),
    }
}

/// Excel stores counts as floats; render whole numbers without the fraction.
fn format_numeric(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
