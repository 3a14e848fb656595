//! Type-safe enumerations for munger parameters and dictionary elements.
//!
//! The original parameter files carry these as strings; parsing happens once
//! at config-load time and everything downstream matches on the enum.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCategory, LoadError};

/// Source file family, from the munger's `file_type` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    Excel,
    FlatText,
    Xml,
    JsonNested,
}

impl FileType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excel => "excel",
            Self::FlatText => "flat_text",
            Self::Xml => "xml",
            Self::JsonNested => "json-nested",
        }
    }
}

impl FromStr for FileType {
    type Err = LoadError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "excel" => Ok(Self::Excel),
            "flat_text" => Ok(Self::FlatText),
            "xml" => Ok(Self::Xml),
            "json-nested" => Ok(Self::JsonNested),
            other => Err(LoadError::new(
                ErrorCategory::Munger,
                "file_type",
                format!("unrecognized file_type: {other}"),
            )),
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How count columns are identified, from the munger's `count_location` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CountLocation {
    ByName,
    ByNumber,
}

impl FromStr for CountLocation {
    type Err = LoadError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "by_name" => Ok(Self::ByName),
            "by_number" => Ok(Self::ByNumber),
            other => Err(LoadError::new(
                ErrorCategory::Munger,
                "count_location",
                format!("unrecognized count_location: {other}"),
            )),
        }
    }
}

/// Element types recognized in a jurisdiction dictionary's `cdf_element`
/// column and in munge formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CdfElement {
    ReportingUnit,
    Party,
    CandidateContest,
    BallotMeasureContest,
    Candidate,
    BallotMeasureSelection,
    CountItemType,
}

impl CdfElement {
    pub const ALL: [Self; 7] = [
        Self::ReportingUnit,
        Self::Party,
        Self::CandidateContest,
        Self::BallotMeasureContest,
        Self::Candidate,
        Self::BallotMeasureSelection,
        Self::CountItemType,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReportingUnit => "ReportingUnit",
            Self::Party => "Party",
            Self::CandidateContest => "CandidateContest",
            Self::BallotMeasureContest => "BallotMeasureContest",
            Self::Candidate => "Candidate",
            Self::BallotMeasureSelection => "BallotMeasureSelection",
            Self::CountItemType => "CountItemType",
        }
    }

    /// The raw-identifier column this element's formula produces.
    pub fn raw_column(self) -> String {
        format!("{}_raw", self.as_str())
    }
}

impl FromStr for CdfElement {
    type Err = LoadError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "ReportingUnit" => Ok(Self::ReportingUnit),
            "Party" => Ok(Self::Party),
            "CandidateContest" => Ok(Self::CandidateContest),
            "BallotMeasureContest" => Ok(Self::BallotMeasureContest),
            "Candidate" => Ok(Self::Candidate),
            "BallotMeasureSelection" => Ok(Self::BallotMeasureSelection),
            "CountItemType" => Ok(Self::CountItemType),
            other => Err(LoadError::new(
                ErrorCategory::Jurisdiction,
                "cdf_element",
                format!("unrecognized cdf_element: {other}"),
            )),
        }
    }
}

impl fmt::Display for CdfElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contest family, used when resolving Contest_raw against both contest
/// dictionaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContestType {
    Candidate,
    BallotMeasure,
}

/// The NIST-standard CountItemType vocabulary. Values outside this list are
/// loaded as-is but flagged with a warning.
pub const NIST_COUNT_ITEM_TYPES: [&str; 12] = [
    "absentee",
    "absentee-fwab",
    "absentee-in-person",
    "absentee-mail",
    "early",
    "election-day",
    "provisional",
    "provisional-failed",
    "seats",
    "total",
    "write-in",
    "other",
];

pub fn is_nist_count_item_type(value: &str) -> bool {
    NIST_COUNT_ITEM_TYPES.contains(&value)
}

/// CountItemType value every dimension group must carry exactly once.
pub const TOTAL_COUNT_ITEM_TYPE: &str = "total";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_type_round_trips() {
        for raw in ["excel", "flat_text", "xml", "json-nested"] {
            let parsed: FileType = raw.parse().expect("parse file_type");
            assert_eq!(parsed.as_str(), raw);
        }
        assert!("shapefile".parse::<FileType>().is_err());
    }

    #[test]
    fn raw_column_names() {
        assert_eq!(CdfElement::Candidate.raw_column(), "Candidate_raw");
        assert_eq!(
            CdfElement::BallotMeasureContest.raw_column(),
            "BallotMeasureContest_raw"
        );
    }

    #[test]
    fn nist_vocabulary() {
        assert!(is_nist_count_item_type("election-day"));
        assert!(is_nist_count_item_type("total"));
        assert!(!is_nist_count_item_type("machine"));
    }
}
