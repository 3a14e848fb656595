//! Delimited-text reading.

use std::fs;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use cdf_model::{Diagnostics, ErrorCategory, LoadError, LoadResult};
use cdf_params::MungerConfig;

/// Read a delimited text file into a cell grid. A strict parse is tried
/// first; on malformed records the file is re-read leniently (ragged rows
/// kept, quoting off) with a warning, and short records are padded during
/// table assembly.
pub fn read_flat_text_grid(
    path: &Path,
    munger: &MungerConfig,
    diags: &mut Diagnostics,
) -> LoadResult<Vec<Vec<String>>> {
    let source = path.display().to_string();
    let bytes = fs::read(path)
        .map_err(|error| LoadError::file(&source, format!("cannot read file: {error}")))?;
    let text = decode(&source, bytes, munger)?;

    match parse_grid(&text, munger.delimiter, false) {
        Ok(grid) => Ok(grid),
        Err(error) => {
            diags.warn(
                ErrorCategory::File,
                &source,
                format!("malformed delimited text ({error}); retrying leniently"),
            );
            parse_grid(&text, munger.delimiter, true).map_err(|error| {
                LoadError::file(&source, format!("unparseable delimited text: {error}"))
            })
        }
    }
}

fn parse_grid(text: &str, delimiter: u8, lenient: bool) -> Result<Vec<Vec<String>>, csv::Error> {
    let mut builder = ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(lenient);
    if lenient {
        builder.quoting(false);
    }
    let mut reader = builder.from_reader(text.as_bytes());
    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(record.iter().map(String::from).collect::<Vec<String>>());
    }
    Ok(grid)
}

fn decode(source: &str, bytes: Vec<u8>, munger: &MungerConfig) -> LoadResult<String> {
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(error) => {
            let encoding = munger.encoding.as_deref().unwrap_or("utf-8");
            if encoding.eq_ignore_ascii_case("utf-8") {
                return Err(LoadError::file(
                    source,
                    format!("file is not valid utf-8: {error}"),
                ));
            }
            // Single-byte encodings (latin-1 family) decode byte-for-byte.
            debug!(source, encoding, "decoding as single-byte encoding");
            Ok(error
                .into_bytes()
                .iter()
                .map(|byte| *byte as char)
                .collect())
        }
    }
}
