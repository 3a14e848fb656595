//! Munger configuration: the declarative description of one results-file
//! family.
//!
//! A munger file has a `[format]` section (file type, count location, header
//! geometry), a `[munge formulas]` section (one template per CDF element),
//! optional `[<field> lookup]` sections for auxiliary files, and an optional
//! `[ignore]` section. Formula templates are kept as raw strings here and
//! compiled to an AST by the munge crate.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use cdf_model::{CdfElement, CountLocation, ErrorCategory, FileType, LoadError, LoadResult};

use crate::sections::{ParamFile, ParamType, ParamValue, SectionReader};

/// An auxiliary/foreign-key file joined in before formula evaluation,
/// described by a `[<field> lookup]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupSpec {
    /// File to read the lookup table from; the results file itself when
    /// absent.
    pub source_file: Option<String>,
    /// Column the lookup table is keyed (and deduplicated) on.
    pub lookup_id: String,
}

#[derive(Debug, Clone)]
pub struct MungerConfig {
    pub name: String,
    pub file_type: FileType,
    pub count_location: CountLocation,
    /// Count columns by header name (`count_location=by_name`).
    pub count_fields_by_name: Vec<String>,
    /// Zero-based count column positions (`count_location=by_number`).
    pub count_column_numbers: Vec<usize>,
    /// Zero-based row holding non-count column names; `None` with
    /// `all_rows=data` means every row is data and columns are synthesized.
    pub noncount_header_row: Option<usize>,
    /// Zero-based rows holding count-column headers (multi-header melt).
    pub count_header_row_numbers: Vec<usize>,
    /// Every row is data; no header rows at all.
    pub all_rows_data: bool,
    pub rows_to_skip: usize,
    pub delimiter: u8,
    pub thousands_separator: Option<char>,
    pub encoding: Option<String>,
    pub sheets_to_read_names: Vec<String>,
    pub sheets_to_skip_names: Vec<String>,
    pub sheets_to_read_numbers: Vec<usize>,
    /// Sheet contains several stacked tables separated by caption rows.
    pub multi_block: bool,
    pub max_blocks: Option<usize>,
    /// Zero-based rows whose first non-empty cell becomes a per-sheet
    /// constant column (`constant_row_N`).
    pub constant_rows: Vec<usize>,
    /// Elements whose value comes from the results descriptor, not a formula.
    pub constant_over_file: Vec<CdfElement>,
    /// Raw formula template per element.
    pub formulas: BTreeMap<CdfElement, String>,
    /// Lookup table specs keyed by the `from` field name.
    pub lookups: BTreeMap<String, LookupSpec>,
    /// Raw values excluded per element before dictionary resolution.
    pub ignore: BTreeMap<CdfElement, Vec<String>>,
}

impl MungerConfig {
    pub fn from_path(path: &Path) -> LoadResult<Self> {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let file = ParamFile::from_path(path, ErrorCategory::Munger)?;
        let config = Self::from_param_file(&name, &file)?;
        debug!(munger = %config.name, file_type = %config.file_type, "loaded munger");
        Ok(config)
    }

    pub fn from_param_file(name: &str, file: &ParamFile) -> LoadResult<Self> {
        let format = file.section("format", name, ErrorCategory::Munger)?;

        let file_type = FileType::from_str(format.require("file_type")?)?;
        let count_location = CountLocation::from_str(format.require("count_location")?)?;

        let mut count_fields_by_name = Vec::new();
        let mut count_column_numbers = Vec::new();
        match count_location {
            CountLocation::ByName => {
                let value = format.require_typed("count_fields_by_name", ParamType::StrList)?;
                count_fields_by_name = value.as_str_list().unwrap_or_default().to_vec();
            }
            CountLocation::ByNumber => {
                let value = format.require_typed("count_column_numbers", ParamType::IntList)?;
                count_column_numbers = to_usize_list(name, "count_column_numbers", &value)?;
            }
        }

        let all_rows_data = matches!(format.optional("all_rows"), Some("data"));
        let noncount_header_row = optional_usize(&format, name, "noncount_header_row")?;
        if all_rows_data && noncount_header_row.is_some() {
            return Err(LoadError::munger(
                name,
                "all_rows=data conflicts with noncount_header_row",
            ));
        }
        let count_header_row_numbers =
            match format.optional_typed("count_header_row_numbers", ParamType::IntList)? {
                Some(value) => to_usize_list(name, "count_header_row_numbers", &value)?,
                None => Vec::new(),
            };

        let rows_to_skip = optional_usize(&format, name, "rows_to_skip")?.unwrap_or(0);
        let delimiter = match format.optional("flat_text_delimiter") {
            None => b',',
            Some("tab") => b'\t',
            Some(other) => {
                let Some(first) = other.chars().next() else {
                    return Err(LoadError::munger(name, "empty flat_text_delimiter"));
                };
                if !first.is_ascii() {
                    return Err(LoadError::munger(
                        name,
                        format!("flat_text_delimiter must be ascii: {other}"),
                    ));
                }
                first as u8
            }
        };
        let thousands_separator = format
            .optional("thousands_separator")
            .and_then(|value| value.chars().next());
        let encoding = format.optional("encoding").map(String::from);

        let sheets_to_read_names = optional_str_list(&format, "sheets_to_read_names")?;
        let sheets_to_skip_names = optional_str_list(&format, "sheets_to_skip_names")?;
        let sheets_to_read_numbers =
            match format.optional_typed("sheets_to_read_numbers", ParamType::IntList)? {
                Some(value) => to_usize_list(name, "sheets_to_read_numbers", &value)?,
                None => Vec::new(),
            };

        let multi_block = matches!(format.optional("multi_block"), Some("yes"));
        let max_blocks = optional_usize(&format, name, "max_blocks")?;
        let constant_rows = match format.optional_typed("constant_rows", ParamType::IntList)? {
            Some(value) => to_usize_list(name, "constant_rows", &value)?,
            None => Vec::new(),
        };

        let mut constant_over_file = Vec::new();
        for raw in optional_str_list(&format, "constant_over_file")? {
            constant_over_file.push(CdfElement::from_str(&raw).map_err(|_| {
                LoadError::munger(name, format!("constant_over_file names unknown element {raw}"))
            })?);
        }

        let formulas = read_formulas(name, file)?;
        let lookups = read_lookups(name, file)?;
        let ignore = read_ignore(name, file)?;

        let config = Self {
            name: name.to_string(),
            file_type,
            count_location,
            count_fields_by_name,
            count_column_numbers,
            noncount_header_row,
            count_header_row_numbers,
            all_rows_data,
            rows_to_skip,
            delimiter,
            thousands_separator,
            encoding,
            sheets_to_read_names,
            sheets_to_skip_names,
            sheets_to_read_numbers,
            multi_block,
            max_blocks,
            constant_rows,
            constant_over_file,
            formulas,
            lookups,
            ignore,
        };
        config.check_element_coverage()?;
        Ok(config)
    }

    /// Whether `element` gets a value from this munger (formula or
    /// file-level constant).
    pub fn covers(&self, element: CdfElement) -> bool {
        self.formulas.contains_key(&element) || self.constant_over_file.contains(&element)
    }

    fn check_element_coverage(&self) -> LoadResult<()> {
        for element in [CdfElement::ReportingUnit, CdfElement::CountItemType] {
            if !self.covers(element) {
                return Err(LoadError::munger(
                    &self.name,
                    format!("no formula or constant for required element {element}"),
                ));
            }
        }
        let candidate_side = self.covers(CdfElement::CandidateContest);
        let measure_side = self.covers(CdfElement::BallotMeasureContest);
        if !candidate_side && !measure_side {
            return Err(LoadError::munger(
                &self.name,
                "munger covers neither CandidateContest nor BallotMeasureContest",
            ));
        }
        if candidate_side && !self.covers(CdfElement::Candidate) {
            return Err(LoadError::munger(
                &self.name,
                "CandidateContest is covered but Candidate is not",
            ));
        }
        if measure_side && !self.covers(CdfElement::BallotMeasureSelection) {
            return Err(LoadError::munger(
                &self.name,
                "BallotMeasureContest is covered but BallotMeasureSelection is not",
            ));
        }
        Ok(())
    }
}

fn read_formulas(name: &str, file: &ParamFile) -> LoadResult<BTreeMap<CdfElement, String>> {
    let section = file.section("munge formulas", name, ErrorCategory::Munger)?;
    let mut formulas = BTreeMap::new();
    for key in section.keys() {
        let element = CdfElement::from_str(key)
            .map_err(|_| LoadError::munger(name, format!("formula for unknown element {key}")))?;
        let formula = section.optional(key).unwrap_or_default();
        if formula.is_empty() {
            return Err(LoadError::munger(name, format!("empty formula for {key}")));
        }
        formulas.insert(element, formula.to_string());
    }
    Ok(formulas)
}

fn read_lookups(name: &str, file: &ParamFile) -> LoadResult<BTreeMap<String, LookupSpec>> {
    let mut lookups = BTreeMap::new();
    for section_name in file.sections.keys() {
        let Some(field) = section_name.strip_suffix(" lookup") else {
            continue;
        };
        let section = file.section(section_name, name, ErrorCategory::Munger)?;
        let lookup_id = section.require("lookup_id")?.to_string();
        let source_file = section.optional("source_file").map(String::from);
        lookups.insert(
            field.trim().to_string(),
            LookupSpec {
                source_file,
                lookup_id,
            },
        );
    }
    Ok(lookups)
}

fn read_ignore(name: &str, file: &ParamFile) -> LoadResult<BTreeMap<CdfElement, Vec<String>>> {
    let mut ignore = BTreeMap::new();
    if !file.has_section("ignore") {
        return Ok(ignore);
    }
    let section = file.section("ignore", name, ErrorCategory::Munger)?;
    for key in section.keys() {
        let element = CdfElement::from_str(key).map_err(|_| {
            LoadError::munger(name, format!("ignore list for unknown element {key}"))
        })?;
        let values = section
            .optional(key)
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(String::from)
            .collect();
        ignore.insert(element, values);
    }
    Ok(ignore)
}

fn optional_usize(
    section: &SectionReader<'_>,
    name: &str,
    key: &str,
) -> LoadResult<Option<usize>> {
    match section.optional_typed(key, ParamType::Int)? {
        Some(value) => {
            let int = value.as_int().unwrap_or(-1);
            usize::try_from(int)
                .map(Some)
                .map_err(|_| LoadError::munger(name, format!("{key} must be non-negative")))
        }
        None => Ok(None),
    }
}

fn optional_str_list(section: &SectionReader<'_>, key: &str) -> LoadResult<Vec<String>> {
    Ok(section
        .optional_typed(key, ParamType::StrList)?
        .and_then(|value| value.as_str_list().map(<[String]>::to_vec))
        .unwrap_or_default())
}

fn to_usize_list(name: &str, key: &str, value: &ParamValue) -> LoadResult<Vec<usize>> {
    let mut out = Vec::new();
    for int in value.as_int_list().unwrap_or_default() {
        let converted = usize::try_from(*int)
            .map_err(|_| LoadError::munger(name, format!("{key} entries must be non-negative")))?;
        out.push(converted);
    }
    Ok(out)
}
