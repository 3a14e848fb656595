//! Results descriptor files: one per results file, identifying the file,
//! its election and jurisdiction, and the mungers that understand it.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;

use cdf_model::{CdfElement, ErrorCategory, LoadError, LoadResult};

use crate::sections::ParamFile;

pub const DESCRIPTOR_SECTION: &str = "election_results";

#[derive(Debug, Clone)]
pub struct ResultsDescriptor {
    /// Name of the results file, relative to the results directory.
    pub results_file: String,
    pub short_name: String,
    pub download_date: NaiveDate,
    pub source: String,
    pub note: String,
    pub election: String,
    /// Top ReportingUnit name for the jurisdiction, e.g. `Georgia`.
    pub jurisdiction: String,
    pub munger_names: Vec<String>,
    /// Fixed element values for the whole file, for elements the munger
    /// declares `constant_over_file`.
    pub constants: BTreeMap<CdfElement, String>,
}

impl ResultsDescriptor {
    pub fn from_path(path: &Path) -> LoadResult<Self> {
        let source = path.display().to_string();
        let file = ParamFile::from_path(path, ErrorCategory::Ini)?;
        Self::from_param_file(&source, &file)
    }

    pub fn from_param_file(source: &str, file: &ParamFile) -> LoadResult<Self> {
        let section = file.section(DESCRIPTOR_SECTION, source, ErrorCategory::Ini)?;

        let raw_date = section.require("results_download_date")?;
        let download_date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|_| {
            LoadError::ini(
                source,
                format!("results_download_date must be YYYY-MM-DD, got {raw_date}"),
            )
        })?;

        let munger_names: Vec<String> = section
            .require("munger_list")?
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();
        if munger_names.is_empty() {
            return Err(LoadError::ini(source, "munger_list names no mungers"));
        }

        let mut constants = BTreeMap::new();
        for key in section.keys() {
            if let Ok(element) = CdfElement::from_str(key)
                && let Some(value) = section.optional(key)
            {
                constants.insert(element, value.to_string());
            }
        }

        Ok(Self {
            results_file: section.require("results_file")?.to_string(),
            short_name: section.require("results_short_name")?.to_string(),
            download_date,
            source: section.require("results_source")?.to_string(),
            note: section.require("results_note")?.to_string(),
            election: section.require("election")?.to_string(),
            jurisdiction: section.require("top_reporting_unit")?.to_string(),
            munger_names,
            constants,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: &str = "\
[election_results]
results_file=ga/ga_general_precincts.txt
results_short_name=ga20g_precincts
results_download_date=2020-11-21
results_source=GA Secretary of State
results_note=precinct-level export
election=2020 General
top_reporting_unit=Georgia
munger_list=ga_precincts, ga_precincts_alt
Party=Democratic Party
";

    #[test]
    fn parses_descriptor() {
        let file = ParamFile::parse(DESCRIPTOR);
        let descriptor = ResultsDescriptor::from_param_file("ga.ini", &file).expect("descriptor");
        assert_eq!(descriptor.short_name, "ga20g_precincts");
        assert_eq!(
            descriptor.download_date,
            NaiveDate::from_ymd_opt(2020, 11, 21).expect("date")
        );
        assert_eq!(descriptor.munger_names.len(), 2);
        assert_eq!(
            descriptor.constants.get(&CdfElement::Party).map(String::as_str),
            Some("Democratic Party")
        );
    }

    #[test]
    fn bad_date_is_an_ini_error() {
        let text = DESCRIPTOR.replace("2020-11-21", "11/21/2020");
        let file = ParamFile::parse(&text);
        let error = ResultsDescriptor::from_param_file("ga.ini", &file).expect_err("bad date");
        assert_eq!(error.category, ErrorCategory::Ini);
        assert!(error.message.contains("YYYY-MM-DD"));
    }

    #[test]
    fn missing_required_key_is_reported() {
        let text = DESCRIPTOR.replace("election=2020 General\n", "");
        let file = ParamFile::parse(&text);
        let error = ResultsDescriptor::from_param_file("ga.ini", &file).expect_err("missing key");
        assert!(error.message.contains("election"));
    }
}
