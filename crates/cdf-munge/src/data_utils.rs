//! Small polars value helpers shared by the munge and resolve stages.

use polars::prelude::{AnyValue, DataFrame, NamedFrom, Series};

use cdf_model::{LoadError, LoadResult};

pub fn any_to_string(value: AnyValue) -> String {
    match value {
        AnyValue::String(value) => value.to_string(),
        AnyValue::StringOwned(value) => value.to_string(),
        AnyValue::Null => String::new(),
        _ => value.to_string(),
    }
}

pub fn any_to_i64(value: AnyValue) -> Option<i64> {
    match value {
        AnyValue::Null => None,
        AnyValue::Int8(value) => Some(value as i64),
        AnyValue::Int16(value) => Some(value as i64),
        AnyValue::Int32(value) => Some(value as i64),
        AnyValue::Int64(value) => Some(value),
        AnyValue::UInt8(value) => Some(value as i64),
        AnyValue::UInt16(value) => Some(value as i64),
        AnyValue::UInt32(value) => Some(value as i64),
        AnyValue::UInt64(value) => Some(value as i64),
        AnyValue::Float32(value) => Some(value as i64),
        AnyValue::Float64(value) => Some(value as i64),
        _ => None,
    }
}

/// All values of a column as strings; missing column is a system error since
/// callers validate column presence beforehand.
pub fn string_column(df: &DataFrame, name: &str) -> LoadResult<Vec<String>> {
    let column = df
        .column(name)
        .map_err(|error| LoadError::system(name, format!("missing column: {error}")))?;
    Ok((0..df.height())
        .map(|idx| any_to_string(column.get(idx).unwrap_or(AnyValue::Null)))
        .collect())
}

pub fn i64_column(df: &DataFrame, name: &str) -> LoadResult<Vec<i64>> {
    let column = df
        .column(name)
        .map_err(|error| LoadError::system(name, format!("missing column: {error}")))?;
    Ok((0..df.height())
        .map(|idx| any_to_i64(column.get(idx).unwrap_or(AnyValue::Null)).unwrap_or(0))
        .collect())
}

pub fn with_string_column(
    df: &mut DataFrame,
    name: &str,
    values: Vec<String>,
) -> LoadResult<()> {
    df.with_column(Series::new(name.into(), values))
        .map_err(|error| LoadError::system(name, format!("cannot add column: {error}")))?;
    Ok(())
}

pub fn with_i64_column(df: &mut DataFrame, name: &str, values: Vec<i64>) -> LoadResult<()> {
    df.with_column(Series::new(name.into(), values))
        .map_err(|error| LoadError::system(name, format!("cannot add column: {error}")))?;
    Ok(())
}

/// Keep only rows where `mask` is true.
pub fn filter_rows(df: &DataFrame, mask: &[bool]) -> LoadResult<DataFrame> {
    let mask = polars::prelude::BooleanChunked::new("mask".into(), mask);
    df.filter(&mask)
        .map_err(|error| LoadError::system("filter", format!("cannot filter rows: {error}")))
}
