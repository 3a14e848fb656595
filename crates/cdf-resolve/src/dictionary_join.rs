//! Join `_raw` columns against the jurisdiction dictionary.
//!
//! Each element's raw values become internal names in a plain column named
//! after the element. The `"row should be dropped"` sentinel always removes
//! the row; what happens to unmatched values depends on the element's
//! `drop_unmatched` policy.

use std::collections::BTreeMap;

use tracing::debug;

use cdf_model::{
    CdfElement, Diagnostics, ErrorCategory, LoadError, LoadResult, NONE_OR_UNKNOWN,
    ROW_SHOULD_BE_DROPPED,
};
use cdf_munge::data_utils::with_string_column;
use cdf_munge::{CountFrame, regularize_candidate_name};
use cdf_params::Dictionary;

use crate::contests::resolve_contests;

/// How many unmatched raw values a warning lists before truncating.
const LISTED_VALUES: usize = 10;

/// Whether unmatched raw values drop the row instead of falling back to
/// `"none or unknown"`.
pub fn drop_unmatched(element: CdfElement) -> bool {
    matches!(
        element,
        CdfElement::ReportingUnit | CdfElement::CountItemType | CdfElement::BallotMeasureSelection
    )
}

fn format_values(values: &[String]) -> String {
    let mut listed = values
        .iter()
        .take(LISTED_VALUES)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if values.len() > LISTED_VALUES {
        listed.push_str(&format!(" (and {} more)", values.len() - LISTED_VALUES));
    }
    listed
}

/// Resolve one element's raw column to internal names, writing a column
/// named after the element and dropping sentinel/unmatched rows per policy.
pub fn resolve_element(
    frame: &mut CountFrame,
    element: CdfElement,
    dictionary: &Dictionary,
    diags: &mut Diagnostics,
) -> LoadResult<()> {
    if !frame.has_raw_column(element) {
        return Ok(());
    }
    let drop_policy = drop_unmatched(element);
    let mut raws = frame.raw_values(element)?;
    let entries: BTreeMap<String, String> = match dictionary.entries(element) {
        Some(entries) if element == CdfElement::Candidate => {
            let mut regularized = BTreeMap::new();
            for (raw, internal) in entries {
                let key = regularize_candidate_name(raw);
                if let Some(existing) = regularized.get(&key)
                    && existing != internal
                {
                    diags.warn(
                        ErrorCategory::Jurisdiction,
                        element.as_str(),
                        format!(
                            "distinct raw values regularize to {key} but name both \
                             {existing} and {internal}; keeping {internal}"
                        ),
                    );
                }
                regularized.insert(key, internal.clone());
            }
            regularized
        }
        Some(entries) => entries.clone(),
        None => BTreeMap::new(),
    };
    if element == CdfElement::Candidate {
        for raw in &mut raws {
            *raw = regularize_candidate_name(raw);
        }
    }

    let before = frame.height();
    let mut keep = vec![true; before];
    let mut resolved = Vec::with_capacity(before);
    let mut unmatched: Vec<String> = Vec::new();
    for (idx, raw) in raws.iter().enumerate() {
        match entries.get(raw).map(String::as_str) {
            Some(ROW_SHOULD_BE_DROPPED) => {
                keep[idx] = false;
                resolved.push(String::new());
            }
            Some(internal) => resolved.push(internal.to_string()),
            None => {
                if !unmatched.contains(raw) {
                    unmatched.push(raw.clone());
                }
                if drop_policy {
                    keep[idx] = false;
                    resolved.push(String::new());
                } else {
                    resolved.push(NONE_OR_UNKNOWN.to_string());
                }
            }
        }
    }

    if !unmatched.is_empty() {
        let action = if drop_policy {
            "rows dropped"
        } else {
            "kept as none or unknown"
        };
        diags.warn(
            ErrorCategory::Jurisdiction,
            element.as_str(),
            format!(
                "no dictionary entry for raw values ({action}): {}",
                format_values(&unmatched)
            ),
        );
    }

    with_string_column(&mut frame.data, element.as_str(), resolved)?;
    if keep.iter().any(|kept| !kept) {
        frame.retain_rows(&keep)?;
    }
    debug!(%element, before, after = frame.height(), "dictionary join");
    if before > 0 && frame.height() == 0 && drop_policy {
        return Err(LoadError::jurisdiction(
            element.as_str(),
            "every row was dropped: no raw value matched the dictionary",
        ));
    }
    Ok(())
}

/// Resolve every raw column to internal names: the five single-dictionary
/// elements plus the dual-dictionary contest pass.
pub fn resolve_names(
    frame: &mut CountFrame,
    dictionary: &Dictionary,
    diags: &mut Diagnostics,
) -> LoadResult<()> {
    for element in [
        CdfElement::ReportingUnit,
        CdfElement::Party,
        CdfElement::Candidate,
        CdfElement::BallotMeasureSelection,
        CdfElement::CountItemType,
    ] {
        resolve_element(frame, element, dictionary, diags)?;
    }
    resolve_contests(frame, dictionary, diags)
}

#[cfg(test)]
mod tests {
    use polars::prelude::{DataFrame, NamedFrom, Series};

    use cdf_munge::data_utils::string_column;

    use super::*;

    fn frame(element: CdfElement, raws: &[&str]) -> CountFrame {
        let raw_column: polars::prelude::Column = Series::new(
            element.raw_column().as_str().into(),
            raws.iter().map(|raw| (*raw).to_string()).collect::<Vec<_>>(),
        )
        .into();
        let counts: polars::prelude::Column =
            Series::new("Count".into(), vec![1i64; raws.len()]).into();
        CountFrame {
            data: DataFrame::new(vec![raw_column, counts]).expect("frame"),
        }
    }

    fn dictionary(element: CdfElement, pairs: &[(&str, &str)]) -> Dictionary {
        let mut dictionary = Dictionary::new();
        for (raw, internal) in pairs {
            dictionary.insert(element, *raw, *internal);
        }
        dictionary
    }

    #[test]
    fn unmatched_party_falls_back_with_warning() {
        let mut frame = frame(CdfElement::Party, &["DEM", "X. Y. Z."]);
        let dictionary = dictionary(CdfElement::Party, &[("DEM", "Democratic Party")]);
        let mut diags = Diagnostics::new();
        resolve_element(&mut frame, CdfElement::Party, &dictionary, &mut diags).expect("resolve");
        let resolved = string_column(&frame.data, "Party").expect("column");
        assert_eq!(resolved, vec!["Democratic Party", NONE_OR_UNKNOWN]);
        assert_eq!(diags.warning_count(), 1);
        let warning = diags.warnings().next().expect("warning");
        assert!(warning.message.contains("X. Y. Z."));
    }

    #[test]
    fn unmatched_reporting_unit_drops_the_row() {
        let mut frame = frame(CdfElement::ReportingUnit, &["Jones;12", "Mystery"]);
        let dictionary = dictionary(
            CdfElement::ReportingUnit,
            &[("Jones;12", "Georgia;Jones County;Precinct 12")],
        );
        let mut diags = Diagnostics::new();
        resolve_element(&mut frame, CdfElement::ReportingUnit, &dictionary, &mut diags)
            .expect("resolve");
        assert_eq!(frame.height(), 1);
        assert_eq!(diags.warning_count(), 1);
    }

    #[test]
    fn all_rows_dropped_escalates_to_fatal() {
        let mut frame = frame(CdfElement::ReportingUnit, &["Mystery"]);
        let dictionary = Dictionary::new();
        let mut diags = Diagnostics::new();
        let error =
            resolve_element(&mut frame, CdfElement::ReportingUnit, &dictionary, &mut diags)
                .expect_err("all rows dropped");
        assert_eq!(error.category, ErrorCategory::Jurisdiction);
    }

    #[test]
    fn drop_sentinel_always_removes_rows() {
        let mut frame = frame(CdfElement::Party, &["DEM", "Totals"]);
        let dictionary = dictionary(
            CdfElement::Party,
            &[("DEM", "Democratic Party"), ("Totals", ROW_SHOULD_BE_DROPPED)],
        );
        let mut diags = Diagnostics::new();
        resolve_element(&mut frame, CdfElement::Party, &dictionary, &mut diags).expect("resolve");
        assert_eq!(frame.height(), 1);
        // Deliberate exclusion, no warning.
        assert_eq!(diags.warning_count(), 0);
    }

    #[test]
    fn colliding_candidate_raws_warn() {
        let mut frame = frame(CdfElement::Candidate, &["Smith J"]);
        // Both raws regularize to "Smith J" but name different candidates.
        let dictionary = dictionary(
            CdfElement::Candidate,
            &[("SMITH J", "John Smith"), ("Smith J", "Jane Smith")],
        );
        let mut diags = Diagnostics::new();
        resolve_element(&mut frame, CdfElement::Candidate, &dictionary, &mut diags)
            .expect("resolve");
        assert_eq!(diags.warning_count(), 1);
        let warning = diags.warnings().next().expect("warning");
        assert_eq!(warning.category, ErrorCategory::Jurisdiction);
        assert!(warning.message.contains("Smith J"));
        // The later entry wins deterministically.
        let resolved = string_column(&frame.data, "Candidate").expect("column");
        assert_eq!(resolved, vec!["Jane Smith"]);
    }

    #[test]
    fn candidate_matching_regularizes_both_sides() {
        let mut frame = frame(CdfElement::Candidate, &["SMITH JOHN"]);
        let dictionary = dictionary(CdfElement::Candidate, &[("Smith John", "John Smith")]);
        let mut diags = Diagnostics::new();
        resolve_element(&mut frame, CdfElement::Candidate, &dictionary, &mut diags)
            .expect("resolve");
        let resolved = string_column(&frame.data, "Candidate").expect("column");
        assert_eq!(resolved, vec!["John Smith"]);
        assert_eq!(diags.warning_count(), 0);
    }
}
