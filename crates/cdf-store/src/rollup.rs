//! Roll counts up the reporting-unit nesting and audit totals.

use std::collections::BTreeMap;

use cdf_model::{ContestId, ElectionId, LoadResult, ReportingUnitId, TOTAL_COUNT_ITEM_TYPE};

use crate::store::CdfStore;

/// One rolled-up count at a chosen nesting depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollupRow {
    pub contest_id: ContestId,
    pub reporting_unit: String,
    pub count_item_type: String,
    pub count: i64,
}

/// A (contest, unit) group whose `total` row disagrees with the sum of its
/// other vote types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalsMismatch {
    pub contest_id: ContestId,
    pub reporting_unit: String,
    pub total: i64,
    pub summed: i64,
}

fn unit_names(store: &dyn CdfStore) -> LoadResult<BTreeMap<ReportingUnitId, String>> {
    Ok(store
        .reporting_units()?
        .into_iter()
        .map(|unit| (unit.id, unit.name))
        .collect())
}

/// Truncate a semicolon-delimited name to its first `depth` segments. Names
/// shallower than `depth` stand for themselves.
fn ancestor_at_depth(name: &str, depth: usize) -> String {
    let mut end = 0;
    for (seen, segment) in name.split(';').enumerate() {
        if seen == depth {
            break;
        }
        end += segment.len() + usize::from(seen > 0);
    }
    name[..end].to_string()
}

/// Sum an election's counts per (contest, unit-at-depth, vote type).
/// Depth 1 rolls everything up to top-level units, depth 2 to their major
/// subdivisions, and so on.
pub fn rollup(
    store: &dyn CdfStore,
    election_id: ElectionId,
    depth: usize,
) -> LoadResult<Vec<RollupRow>> {
    let names = unit_names(store)?;
    let mut grouped: BTreeMap<(ContestId, String, String), i64> = BTreeMap::new();
    for row in store.vote_counts()? {
        if row.election_id != election_id {
            continue;
        }
        let unit = names
            .get(&row.reporting_unit_id)
            .map(|name| ancestor_at_depth(name, depth))
            .unwrap_or_default();
        *grouped
            .entry((row.contest_id, unit, row.count_item_type))
            .or_insert(0) += row.count;
    }
    Ok(grouped
        .into_iter()
        .map(|((contest_id, reporting_unit, count_item_type), count)| RollupRow {
            contest_id,
            reporting_unit,
            count_item_type,
            count,
        })
        .collect())
}

/// Check that wherever a (contest, unit-at-depth) group carries both a
/// `total` row and other vote types, the others sum to the total.
pub fn check_totals_match_vote_types(
    store: &dyn CdfStore,
    election_id: ElectionId,
    depth: usize,
) -> LoadResult<Vec<TotalsMismatch>> {
    let mut totals: BTreeMap<(ContestId, String), i64> = BTreeMap::new();
    let mut sums: BTreeMap<(ContestId, String), i64> = BTreeMap::new();
    for row in rollup(store, election_id, depth)? {
        let key = (row.contest_id, row.reporting_unit);
        if row.count_item_type == TOTAL_COUNT_ITEM_TYPE {
            *totals.entry(key).or_insert(0) += row.count;
        } else {
            *sums.entry(key).or_insert(0) += row.count;
        }
    }
    let mut mismatches = Vec::new();
    for ((contest_id, reporting_unit), total) in totals {
        let Some(summed) = sums.get(&(contest_id, reporting_unit.clone())).copied() else {
            continue;
        };
        if summed != total {
            mismatches.push(TotalsMismatch {
                contest_id,
                reporting_unit,
                total,
                summed,
            });
        }
    }
    Ok(mismatches)
}

#[cfg(test)]
mod tests {
    use cdf_model::{DatafileId, SelectionId, VoteCount};

    use crate::memory::MemoryStore;
    use crate::reporting_units::ensure_reporting_unit;
    use crate::store::ConflictMode;

    use super::*;

    fn seed() -> (MemoryStore, ReportingUnitId, ReportingUnitId) {
        let mut store = MemoryStore::new();
        let p4 = ensure_reporting_unit(&mut store, "Georgia;Fulton County;Precinct 4", "precinct")
            .expect("precinct 4");
        let p9 = ensure_reporting_unit(&mut store, "Georgia;Fulton County;Precinct 9", "precinct")
            .expect("precinct 9");
        (store, p4, p9)
    }

    fn row(unit: ReportingUnitId, item_type: &str, count: i64) -> VoteCount {
        VoteCount {
            election_id: ElectionId(1),
            reporting_unit_id: unit,
            contest_id: ContestId(1),
            selection_id: SelectionId(1),
            count_item_type: item_type.to_string(),
            count,
            datafile_id: DatafileId(1),
        }
    }

    #[test]
    fn ancestor_at_depth_truncates_segments() {
        assert_eq!(ancestor_at_depth("Georgia;Fulton County;Precinct 4", 2), "Georgia;Fulton County");
        assert_eq!(ancestor_at_depth("Georgia;Fulton County;Precinct 4", 1), "Georgia");
        assert_eq!(ancestor_at_depth("Georgia", 2), "Georgia");
    }

    #[test]
    fn rollup_sums_precincts_into_their_county() {
        let (mut store, p4, p9) = seed();
        store
            .insert_vote_counts(
                &[row(p4, "total", 100), row(p9, "total", 50)],
                ConflictMode::InsertIgnore,
            )
            .expect("insert");
        let rows = rollup(&store, ElectionId(1), 2).expect("rollup");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].reporting_unit, "Georgia;Fulton County");
        assert_eq!(rows[0].count, 150);
    }

    #[test]
    fn matching_totals_produce_no_mismatch() {
        let (mut store, p4, _) = seed();
        store
            .insert_vote_counts(
                &[
                    row(p4, "total", 100),
                    row(p4, "election-day", 60),
                    row(p4, "absentee", 40),
                ],
                ConflictMode::InsertIgnore,
            )
            .expect("insert");
        let mismatches =
            check_totals_match_vote_types(&store, ElectionId(1), 2).expect("check");
        assert!(mismatches.is_empty());
    }

    #[test]
    fn disagreeing_totals_are_reported() {
        let (mut store, p4, _) = seed();
        store
            .insert_vote_counts(
                &[
                    row(p4, "total", 100),
                    row(p4, "election-day", 60),
                    row(p4, "absentee", 30),
                ],
                ConflictMode::InsertIgnore,
            )
            .expect("insert");
        let mismatches =
            check_totals_match_vote_types(&store, ElectionId(1), 2).expect("check");
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].total, 100);
        assert_eq!(mismatches[0].summed, 90);
    }
}
