//! Contest resolution against both contest dictionaries.
//!
//! A raw contest value must match exactly one of the CandidateContest and
//! BallotMeasureContest dictionaries. Matching both is a dictionary defect
//! and is detected rather than silently preferring one; matching neither
//! drops the row.

use cdf_model::{
    CdfElement, Diagnostics, ErrorCategory, LoadError, LoadResult, ROW_SHOULD_BE_DROPPED,
};
use cdf_munge::CountFrame;
use cdf_munge::data_utils::with_string_column;
use cdf_params::Dictionary;

/// Resolved contest name column.
pub const CONTEST_COLUMN: &str = "Contest";
/// Per-row contest family column, `Candidate` or `BallotMeasure`.
pub const CONTEST_TYPE_COLUMN: &str = "ContestType";

pub const CANDIDATE_CONTEST: &str = "Candidate";
pub const BALLOT_MEASURE_CONTEST: &str = "BallotMeasure";

fn lookup<'d>(
    dictionary: &'d Dictionary,
    element: CdfElement,
    raw: Option<&str>,
) -> Option<&'d str> {
    dictionary.lookup(element, raw?)
}

pub fn resolve_contests(
    frame: &mut CountFrame,
    dictionary: &Dictionary,
    diags: &mut Diagnostics,
) -> LoadResult<()> {
    let candidate_raws = frame
        .has_raw_column(CdfElement::CandidateContest)
        .then(|| frame.raw_values(CdfElement::CandidateContest))
        .transpose()?;
    let ballot_raws = frame
        .has_raw_column(CdfElement::BallotMeasureContest)
        .then(|| frame.raw_values(CdfElement::BallotMeasureContest))
        .transpose()?;
    if candidate_raws.is_none() && ballot_raws.is_none() {
        return Err(LoadError::munger(
            "contest",
            "no contest raw column present; the munger covers neither contest element",
        ));
    }

    let before = frame.height();
    let mut keep = vec![true; before];
    let mut contests = Vec::with_capacity(before);
    let mut families = Vec::with_capacity(before);
    let mut unmatched: Vec<String> = Vec::new();
    let mut ambiguous: Vec<String> = Vec::new();
    for idx in 0..before {
        let candidate_raw = candidate_raws.as_ref().map(|raws| raws[idx].as_str());
        let ballot_raw = ballot_raws.as_ref().map(|raws| raws[idx].as_str());
        let candidate = lookup(dictionary, CdfElement::CandidateContest, candidate_raw);
        let ballot = lookup(dictionary, CdfElement::BallotMeasureContest, ballot_raw);
        let (contest, family) = match (candidate, ballot) {
            (Some(ROW_SHOULD_BE_DROPPED), _) | (_, Some(ROW_SHOULD_BE_DROPPED)) => {
                keep[idx] = false;
                (String::new(), String::new())
            }
            (Some(_), Some(_)) => {
                keep[idx] = false;
                let raw = candidate_raw.unwrap_or_default().to_string();
                if !ambiguous.contains(&raw) {
                    ambiguous.push(raw);
                }
                (String::new(), String::new())
            }
            (Some(contest), None) => (contest.to_string(), CANDIDATE_CONTEST.to_string()),
            (None, Some(contest)) => (contest.to_string(), BALLOT_MEASURE_CONTEST.to_string()),
            (None, None) => {
                keep[idx] = false;
                let raw = candidate_raw.or(ballot_raw).unwrap_or_default().to_string();
                if !raw.is_empty() && !unmatched.contains(&raw) {
                    unmatched.push(raw);
                }
                (String::new(), String::new())
            }
        };
        contests.push(contest);
        families.push(family);
    }

    if !ambiguous.is_empty() {
        diags.warn(
            ErrorCategory::Munger,
            "contest",
            format!(
                "raw values match both contest dictionaries (rows dropped): {}",
                ambiguous.join(", ")
            ),
        );
    }
    if !unmatched.is_empty() {
        diags.warn(
            ErrorCategory::Jurisdiction,
            "contest",
            format!(
                "raw values match neither contest dictionary (rows dropped): {}",
                unmatched.join(", ")
            ),
        );
    }

    with_string_column(&mut frame.data, CONTEST_COLUMN, contests)?;
    with_string_column(&mut frame.data, CONTEST_TYPE_COLUMN, families)?;
    if keep.iter().any(|kept| !kept) {
        frame.retain_rows(&keep)?;
    }
    if before > 0 && frame.height() == 0 {
        return Err(LoadError::jurisdiction(
            "contest",
            "no contest could be resolved for any row",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use polars::prelude::{DataFrame, NamedFrom, Series};

    use cdf_munge::data_utils::string_column;

    use super::*;

    fn frame(raws: &[&str]) -> CountFrame {
        let raw_column: polars::prelude::Column = Series::new(
            CdfElement::CandidateContest.raw_column().as_str().into(),
            raws.iter().map(|raw| (*raw).to_string()).collect::<Vec<_>>(),
        )
        .into();
        let counts: polars::prelude::Column =
            Series::new("Count".into(), vec![1i64; raws.len()]).into();
        CountFrame {
            data: DataFrame::new(vec![raw_column, counts]).expect("frame"),
        }
    }

    #[test]
    fn single_dictionary_match_sets_contest_and_family() {
        let mut frame = frame(&["GOV", "Q1"]);
        let mut dictionary = Dictionary::new();
        dictionary.insert(CdfElement::CandidateContest, "GOV", "Governor");
        dictionary.insert(CdfElement::BallotMeasureContest, "Q1", "Question 1");
        let mut diags = Diagnostics::new();
        resolve_contests(&mut frame, &dictionary, &mut diags).expect("resolve");
        assert_eq!(
            string_column(&frame.data, CONTEST_COLUMN).expect("contest"),
            vec!["Governor", "Question 1"]
        );
        assert_eq!(
            string_column(&frame.data, CONTEST_TYPE_COLUMN).expect("family"),
            vec![CANDIDATE_CONTEST, BALLOT_MEASURE_CONTEST]
        );
    }

    #[test]
    fn both_dictionaries_matching_is_reported_and_dropped() {
        let mut frame = frame(&["GOV", "SEN"]);
        let mut dictionary = Dictionary::new();
        dictionary.insert(CdfElement::CandidateContest, "GOV", "Governor");
        dictionary.insert(CdfElement::BallotMeasureContest, "GOV", "Governor?");
        dictionary.insert(CdfElement::CandidateContest, "SEN", "US Senate");
        let mut diags = Diagnostics::new();
        resolve_contests(&mut frame, &dictionary, &mut diags).expect("resolve");
        assert_eq!(frame.height(), 1);
        let warning = diags.warnings().next().expect("warning");
        assert_eq!(warning.category, ErrorCategory::Munger);
        assert!(warning.message.contains("GOV"));
    }

    #[test]
    fn neither_dictionary_matching_escalates_when_nothing_remains() {
        let mut frame = frame(&["MYSTERY"]);
        let dictionary = Dictionary::new();
        let mut diags = Diagnostics::new();
        let error = resolve_contests(&mut frame, &dictionary, &mut diags)
            .expect_err("nothing resolved");
        assert_eq!(error.category, ErrorCategory::Jurisdiction);
        assert_eq!(diags.warning_count(), 1);
    }
}
