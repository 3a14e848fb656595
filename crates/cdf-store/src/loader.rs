//! Final aggregation and the bulk VoteCount write.

use std::collections::{BTreeMap, BTreeSet};

use tracing::info;

use cdf_model::{
    ContestId, DatafileId, ElectionId, LoadResult, ReportingUnitId, SelectionId,
    TOTAL_COUNT_ITEM_TYPE, VoteCount,
};

use crate::store::{CdfStore, ConflictMode, InsertOutcome};

type GroupKey = (ElectionId, ReportingUnitId, ContestId, SelectionId, DatafileId);

fn group_key(row: &VoteCount) -> GroupKey {
    (
        row.election_id,
        row.reporting_unit_id,
        row.contest_id,
        row.selection_id,
        row.datafile_id,
    )
}

/// Synthesize a `total` row for every dimension group that lacks one, as the
/// sum of the group's other vote types. Groups that already carry a `total`
/// row get nothing.
pub fn missing_total_counts(rows: &[VoteCount]) -> Vec<VoteCount> {
    let has_total: BTreeSet<GroupKey> = rows
        .iter()
        .filter(|row| row.count_item_type == TOTAL_COUNT_ITEM_TYPE)
        .map(group_key)
        .collect();
    let mut sums: BTreeMap<GroupKey, i64> = BTreeMap::new();
    for row in rows {
        if row.count_item_type == TOTAL_COUNT_ITEM_TYPE || has_total.contains(&group_key(row)) {
            continue;
        }
        *sums.entry(group_key(row)).or_insert(0) += row.count;
    }
    sums.into_iter()
        .map(
            |((election_id, reporting_unit_id, contest_id, selection_id, datafile_id), count)| {
                VoteCount {
                    election_id,
                    reporting_unit_id,
                    contest_id,
                    selection_id,
                    count_item_type: TOTAL_COUNT_ITEM_TYPE.to_string(),
                    count,
                    datafile_id,
                }
            },
        )
        .collect()
}

/// Group on the full dimension tuple and sum counts. Upstream disambiguation
/// can leave duplicate dimension rows; collapsing them here keeps the final
/// write deterministic.
pub fn group_and_sum(rows: Vec<VoteCount>) -> Vec<VoteCount> {
    let mut grouped: BTreeMap<(GroupKey, String), i64> = BTreeMap::new();
    for row in rows {
        *grouped
            .entry((group_key(&row), row.count_item_type))
            .or_insert(0) += row.count;
    }
    grouped
        .into_iter()
        .map(
            |(
                ((election_id, reporting_unit_id, contest_id, selection_id, datafile_id), count_item_type),
                count,
            )| VoteCount {
                election_id,
                reporting_unit_id,
                contest_id,
                selection_id,
                count_item_type,
                count,
                datafile_id,
            },
        )
        .collect()
}

/// Aggregate and write resolved rows: synthesize missing totals, collapse
/// duplicate dimension tuples, then bulk insert.
pub fn load_vote_counts(
    store: &mut dyn CdfStore,
    rows: Vec<VoteCount>,
    mode: ConflictMode,
) -> LoadResult<InsertOutcome> {
    let mut rows = group_and_sum(rows);
    let synthesized = missing_total_counts(&rows);
    if !synthesized.is_empty() {
        info!(groups = synthesized.len(), "synthesized missing total rows");
        rows.extend(synthesized);
    }
    let outcome = store.insert_vote_counts(&rows, mode)?;
    info!(
        inserted = outcome.inserted,
        skipped = outcome.skipped,
        updated = outcome.updated,
        "vote counts written"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use crate::memory::MemoryStore;

    use super::*;

    fn row(selection: i64, item_type: &str, count: i64) -> VoteCount {
        VoteCount {
            election_id: ElectionId(1),
            reporting_unit_id: ReportingUnitId(1),
            contest_id: ContestId(1),
            selection_id: SelectionId(selection),
            count_item_type: item_type.to_string(),
            count,
            datafile_id: DatafileId(1),
        }
    }

    #[test]
    fn synthesizes_exactly_one_total_per_group_lacking_one() {
        let rows = vec![
            row(1, "election-day", 60),
            row(1, "absentee", 40),
            row(2, "election-day", 7),
            row(2, "total", 7),
        ];
        let totals = missing_total_counts(&rows);
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].selection_id, SelectionId(1));
        assert_eq!(totals[0].count_item_type, "total");
        assert_eq!(totals[0].count, 100);
    }

    #[test]
    fn no_synthesis_when_total_already_present() {
        let rows = vec![row(1, "total", 100), row(1, "election-day", 60)];
        assert!(missing_total_counts(&rows).is_empty());
    }

    #[test]
    fn group_and_sum_collapses_duplicates() {
        let rows = vec![
            row(1, "election-day", 30),
            row(1, "election-day", 30),
            row(1, "absentee", 40),
        ];
        let mut grouped = group_and_sum(rows);
        grouped.sort_by(|a, b| a.count_item_type.cmp(&b.count_item_type));
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[1].count_item_type, "election-day");
        assert_eq!(grouped[1].count, 60);
    }

    #[test]
    fn reload_does_not_change_totals() {
        let mut store = MemoryStore::new();
        let rows = vec![row(1, "election-day", 60), row(1, "absentee", 40)];
        load_vote_counts(&mut store, rows.clone(), ConflictMode::InsertIgnore).expect("load");
        let once: i64 = store
            .vote_counts()
            .expect("read")
            .iter()
            .map(|vote| vote.count)
            .sum();
        load_vote_counts(&mut store, rows, ConflictMode::InsertIgnore).expect("reload");
        let twice: i64 = store
            .vote_counts()
            .expect("read")
            .iter()
            .map(|vote| vote.count)
            .sum();
        assert_eq!(once, twice);
        // 60 + 40 plus the synthesized total of 100.
        assert_eq!(once, 200);
    }
}
