//! Standardization and munge-formula evaluation.
//!
//! Raw tables from `cdf-ingest` are melted into count frames holding exactly
//! one `Count` column, then each element's formula is evaluated into a raw
//! column ready for dictionary resolution.

pub mod apply;
pub mod data_utils;
pub mod formula;
pub mod frame;
pub mod standardize;
pub mod text;

pub use apply::apply_formulas;
pub use formula::{FieldRef, FieldSource, Formula, Token};
pub use frame::{COUNT_COLUMN, CountFrame, SOURCE_SUFFIX};
pub use standardize::standardize;
pub use text::{compress_whitespace, regularize_candidate_name};
