//! Name → id resolution and VoteCount assembly.
//!
//! Runs after the dictionary joins, so every dimension column holds internal
//! names. Reporting units are find-or-created (with their name-nesting
//! closure); candidate selections are find-or-created on
//! `(candidate_id, party_id)`; everything else is exact-name lookup.

use std::collections::BTreeMap;

use tracing::debug;

use cdf_model::{
    CandidateId, CdfElement, ContestId, DatafileId, Diagnostics, ElectionId, ErrorCategory,
    LoadError, LoadResult, NONE_OR_UNKNOWN, PartyId, ReportingUnitId, VoteCount,
};
use cdf_munge::CountFrame;
use cdf_munge::data_utils::string_column;
use cdf_store::{CdfStore, ensure_reporting_unit};

use crate::contests::{BALLOT_MEASURE_CONTEST, CONTEST_COLUMN, CONTEST_TYPE_COLUMN};
use crate::count_item_type::audit_count_item_types;

/// Type recorded on reporting units created during a load; jurisdiction prep
/// outside this pipeline assigns real types.
const CREATED_UNIT_TYPE: &str = "unknown";

fn maybe_column(frame: &CountFrame, name: &str) -> LoadResult<Option<Vec<String>>> {
    if frame
        .data
        .get_column_names()
        .iter()
        .any(|column| column.as_str() == name)
    {
        Ok(Some(string_column(&frame.data, name)?))
    } else {
        Ok(None)
    }
}

fn push_unseen(list: &mut Vec<String>, value: &str) {
    if !value.is_empty() && !list.iter().any(|seen| seen == value) {
        list.push(value.to_string());
    }
}

/// Resolve a fully name-resolved frame into VoteCount rows, creating
/// reporting units and candidate selections as needed.
pub fn build_vote_counts(
    frame: &CountFrame,
    store: &mut dyn CdfStore,
    election_id: ElectionId,
    datafile_id: DatafileId,
    diags: &mut Diagnostics,
) -> LoadResult<Vec<VoteCount>> {
    let height = frame.height();
    if height == 0 {
        return Ok(Vec::new());
    }
    let units = string_column(&frame.data, CdfElement::ReportingUnit.as_str())?;
    let contests = string_column(&frame.data, CONTEST_COLUMN)?;
    let families = string_column(&frame.data, CONTEST_TYPE_COLUMN)?;
    let item_types = string_column(&frame.data, CdfElement::CountItemType.as_str())?;
    let counts = frame.counts()?;
    let candidates = maybe_column(frame, CdfElement::Candidate.as_str())?;
    let parties = maybe_column(frame, CdfElement::Party.as_str())?;
    let ballot_selections = maybe_column(frame, CdfElement::BallotMeasureSelection.as_str())?;

    audit_count_item_types(&item_types, diags);

    let mut unit_ids: BTreeMap<String, ReportingUnitId> = BTreeMap::new();
    let mut contest_ids: BTreeMap<String, Option<ContestId>> = BTreeMap::new();
    let mut unknown_contests = Vec::new();
    let mut unknown_candidates = Vec::new();
    let mut unknown_parties = Vec::new();
    let mut unknown_selections = Vec::new();

    let mut rows = Vec::with_capacity(height);
    for idx in 0..height {
        let unit_name = &units[idx];
        let reporting_unit_id = match unit_ids.get(unit_name) {
            Some(id) => *id,
            None => {
                let id = ensure_reporting_unit(store, unit_name, CREATED_UNIT_TYPE)?;
                unit_ids.insert(unit_name.clone(), id);
                id
            }
        };

        let contest_name = &contests[idx];
        let contest_id = match contest_ids.get(contest_name) {
            Some(id) => *id,
            None => {
                let id = store.contest_id(contest_name)?;
                contest_ids.insert(contest_name.clone(), id);
                id
            }
        };
        let Some(contest_id) = contest_id else {
            push_unseen(&mut unknown_contests, contest_name);
            continue;
        };

        let selection_id = if families[idx] == BALLOT_MEASURE_CONTEST {
            let name = ballot_selections
                .as_ref()
                .map(|values| values[idx].as_str())
                .unwrap_or(NONE_OR_UNKNOWN);
            match store.ballot_measure_selection_id(name)? {
                Some(id) => id,
                None => {
                    push_unseen(&mut unknown_selections, name);
                    continue;
                }
            }
        } else {
            let candidate_name = candidates
                .as_ref()
                .map(|values| values[idx].as_str())
                .unwrap_or(NONE_OR_UNKNOWN);
            let candidate_id = match store.candidate_id(candidate_name)? {
                Some(id) => id,
                None => {
                    push_unseen(&mut unknown_candidates, candidate_name);
                    CandidateId::NONE_OR_UNKNOWN
                }
            };
            let party_name = parties
                .as_ref()
                .map(|values| values[idx].as_str())
                .unwrap_or(NONE_OR_UNKNOWN);
            let party_id = match store.party_id(party_name)? {
                Some(id) => id,
                None => {
                    push_unseen(&mut unknown_parties, party_name);
                    PartyId::NONE_OR_UNKNOWN
                }
            };
            store.find_or_create_candidate_selection(candidate_id, party_id)?
        };

        rows.push(VoteCount {
            election_id,
            reporting_unit_id,
            contest_id,
            selection_id,
            count_item_type: item_types[idx].clone(),
            count: counts[idx],
            datafile_id,
        });
    }

    for (key, values, action) in [
        ("Contest", &unknown_contests, "rows dropped"),
        ("Candidate", &unknown_candidates, "kept as none or unknown"),
        ("Party", &unknown_parties, "kept as none or unknown"),
        ("Selection", &unknown_selections, "rows dropped"),
    ] {
        if !values.is_empty() {
            diags.warn(
                ErrorCategory::Jurisdiction,
                key,
                format!("names not present in the store ({action}): {}", values.join(", ")),
            );
        }
    }

    debug!(rows = rows.len(), dropped = height - rows.len(), "resolved vote counts");
    if rows.is_empty() {
        return Err(LoadError::jurisdiction(
            "selection",
            "no row survived id resolution",
        ));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use polars::prelude::{DataFrame, NamedFrom, Series};

    use cdf_model::ContestType;
    use cdf_store::MemoryStore;

    use crate::contests::CANDIDATE_CONTEST;

    use super::*;

    fn resolved_frame(rows: &[(&str, &str, &str, &str, &str, &str, i64)]) -> CountFrame {
        let text = |pick: for<'a> fn(&'a (&'a str, &'a str, &'a str, &'a str, &'a str, &'a str, i64)) -> &'a str,
                    name: &str| {
            let values: Vec<String> = rows.iter().map(|row| pick(row).to_string()).collect();
            let column: polars::prelude::Column = Series::new(name.into(), values).into();
            column
        };
        let counts: polars::prelude::Column =
            Series::new("Count".into(), rows.iter().map(|row| row.6).collect::<Vec<_>>()).into();
        CountFrame {
            data: DataFrame::new(vec![
                text(|row| row.0, "ReportingUnit"),
                text(|row| row.1, "Contest"),
                text(|row| row.2, "ContestType"),
                text(|row| row.3, "Candidate"),
                text(|row| row.4, "Party"),
                text(|row| row.5, "CountItemType"),
                counts,
            ])
            .expect("frame"),
        }
    }

    #[test]
    fn builds_rows_and_reuses_candidate_selections() {
        let mut store = MemoryStore::new();
        store.add_contest("Governor", ContestType::Candidate);
        store.add_candidate("John Smith");
        store.add_party("Democratic Party");
        let frame = resolved_frame(&[
            (
                "Georgia;Fulton County",
                "Governor",
                CANDIDATE_CONTEST,
                "John Smith",
                "Democratic Party",
                "election-day",
                60,
            ),
            (
                "Georgia;Fulton County",
                "Governor",
                CANDIDATE_CONTEST,
                "John Smith",
                "Democratic Party",
                "absentee",
                40,
            ),
        ]);
        let mut diags = Diagnostics::new();
        let rows = build_vote_counts(
            &frame,
            &mut store,
            ElectionId(1),
            DatafileId(1),
            &mut diags,
        )
        .expect("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].selection_id, rows[1].selection_id);
        assert_eq!(diags.warning_count(), 0);
        // The county and its state ancestor were created with their closure.
        assert!(
            store
                .reporting_unit_id("Georgia")
                .expect("lookup")
                .is_some()
        );
    }

    #[test]
    fn unknown_candidate_falls_back_to_the_seeded_record() {
        let mut store = MemoryStore::new();
        store.add_contest("Governor", ContestType::Candidate);
        let frame = resolved_frame(&[(
            "Georgia",
            "Governor",
            CANDIDATE_CONTEST,
            "Write-in Q",
            "none or unknown",
            "total",
            3,
        )]);
        let mut diags = Diagnostics::new();
        let rows = build_vote_counts(
            &frame,
            &mut store,
            ElectionId(1),
            DatafileId(1),
            &mut diags,
        )
        .expect("rows");
        assert_eq!(rows.len(), 1);
        let selections = store.candidate_selections().expect("selections");
        let created = selections
            .iter()
            .find(|selection| selection.id == rows[0].selection_id)
            .expect("created selection");
        assert_eq!(created.candidate_id, CandidateId::NONE_OR_UNKNOWN);
        assert_eq!(diags.warning_count(), 1);
    }

    #[test]
    fn unknown_contest_everywhere_is_fatal() {
        let mut store = MemoryStore::new();
        let frame = resolved_frame(&[(
            "Georgia",
            "Governor",
            CANDIDATE_CONTEST,
            "John Smith",
            "none or unknown",
            "total",
            3,
        )]);
        let mut diags = Diagnostics::new();
        let error = build_vote_counts(
            &frame,
            &mut store,
            ElectionId(1),
            DatafileId(1),
            &mut diags,
        )
        .expect_err("nothing resolved");
        assert_eq!(error.category, ErrorCategory::Jurisdiction);
    }
}
