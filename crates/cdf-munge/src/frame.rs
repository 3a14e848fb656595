//! The standard count frame: exactly one integer `Count` column, every other
//! column a string carrying the `_SOURCE` suffix (raw file fields) or a
//! `_raw` suffix (formula results).

use polars::prelude::DataFrame;

use cdf_model::{CdfElement, LoadResult};

use crate::data_utils::{filter_rows, i64_column, string_column, with_string_column};

pub const COUNT_COLUMN: &str = "Count";
pub const SOURCE_SUFFIX: &str = "_SOURCE";

#[derive(Debug, Clone)]
pub struct CountFrame {
    pub data: DataFrame,
}

impl CountFrame {
    pub fn height(&self) -> usize {
        self.data.height()
    }

    /// Field names available to formulas (source columns minus the suffix).
    pub fn source_fields(&self) -> Vec<String> {
        self.data
            .get_column_names()
            .iter()
            .filter_map(|name| name.as_str().strip_suffix(SOURCE_SUFFIX))
            .map(String::from)
            .collect()
    }

    pub fn has_source_field(&self, field: &str) -> bool {
        self.data
            .get_column_names()
            .iter()
            .any(|name| name.as_str() == format!("{field}{SOURCE_SUFFIX}"))
    }

    pub fn source_values(&self, field: &str) -> LoadResult<Vec<String>> {
        string_column(&self.data, &format!("{field}{SOURCE_SUFFIX}"))
    }

    pub fn counts(&self) -> LoadResult<Vec<i64>> {
        i64_column(&self.data, COUNT_COLUMN)
    }

    pub fn raw_values(&self, element: CdfElement) -> LoadResult<Vec<String>> {
        string_column(&self.data, &element.raw_column())
    }

    pub fn has_raw_column(&self, element: CdfElement) -> bool {
        self.data
            .get_column_names()
            .iter()
            .any(|name| name.as_str() == element.raw_column())
    }

    pub fn set_raw_column(&mut self, element: CdfElement, values: Vec<String>) -> LoadResult<()> {
        with_string_column(&mut self.data, &element.raw_column(), values)
    }

    pub fn retain_rows(&mut self, mask: &[bool]) -> LoadResult<()> {
        self.data = filter_rows(&self.data, mask)?;
        Ok(())
    }

    /// Drop the intermediate `_SOURCE` columns once formulas have run.
    pub fn drop_source_columns(&mut self) -> LoadResult<()> {
        let names: Vec<String> = self
            .data
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .filter(|name| name.ends_with(SOURCE_SUFFIX))
            .collect();
        for name in names {
            let _ = self.data.drop_in_place(&name).map_err(|error| {
                cdf_model::LoadError::system(&name, format!("cannot drop column: {error}"))
            })?;
        }
        Ok(())
    }
}
