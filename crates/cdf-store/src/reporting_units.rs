//! Name-nesting closure over reporting units.
//!
//! Nesting is encoded purely in the semicolon-delimited name:
//! `State;County;Precinct` sits inside `State;County` which sits inside
//! `State`. No parent pointer is stored; the closure table is derived from
//! prefix segments alone.

use cdf_model::{ComposingReportingUnitJoin, LoadResult, ReportingUnitId};

use crate::store::CdfStore;

/// All prefix names of `name`, outermost first, ending with `name` itself.
pub fn ancestor_names(name: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut prefix = String::new();
    for segment in name.split(';') {
        if !prefix.is_empty() {
            prefix.push(';');
        }
        prefix.push_str(segment);
        names.push(prefix.clone());
    }
    names
}

/// Find-or-create the unit and every prefix ancestor, then insert the
/// ancestor/descendant closure rows for the whole chain (each unit is its
/// own ancestor at level 0). Returns the id of the innermost unit.
pub fn ensure_reporting_unit(
    store: &mut dyn CdfStore,
    name: &str,
    reporting_unit_type: &str,
) -> LoadResult<ReportingUnitId> {
    let chain = ancestor_names(name);
    let mut ids: Vec<ReportingUnitId> = Vec::with_capacity(chain.len());
    for (level, ancestor) in chain.iter().enumerate() {
        // Only the innermost unit carries the caller's type; ancestors
        // created on the fly are typed by their nesting depth.
        let unit_type = if level + 1 == chain.len() {
            reporting_unit_type.to_string()
        } else {
            format!("level-{level}")
        };
        ids.push(store.find_or_create_reporting_unit(ancestor, &unit_type)?);
    }
    let mut joins = Vec::new();
    for (child_level, child_id) in ids.iter().enumerate() {
        for parent_id in &ids[..=child_level] {
            joins.push(ComposingReportingUnitJoin {
                parent_id: *parent_id,
                child_id: *child_id,
            });
        }
    }
    store.insert_composing_joins(&joins)?;
    ids.last().copied().ok_or_else(|| {
        cdf_model::LoadError::jurisdiction(name, "empty reporting unit name")
    })
}

#[cfg(test)]
mod tests {
    use cdf_model::NONE_OR_UNKNOWN;

    use crate::memory::MemoryStore;

    use super::*;

    #[test]
    fn ancestor_names_are_prefixes() {
        assert_eq!(
            ancestor_names("State;County;Precinct"),
            vec!["State", "State;County", "State;County;Precinct"]
        );
        assert_eq!(ancestor_names("State"), vec!["State"]);
    }

    #[test]
    fn closure_contains_self_and_every_ancestor() {
        let mut store = MemoryStore::new();
        let precinct = ensure_reporting_unit(&mut store, "State;County;Precinct", "precinct")
            .expect("ensure");
        let state = store
            .reporting_unit_id("State")
            .expect("lookup")
            .expect("state exists");
        let county = store
            .reporting_unit_id("State;County")
            .expect("lookup")
            .expect("county exists");

        let joins = store.composing_joins().expect("joins");
        let has = |parent, child| {
            joins
                .iter()
                .any(|join| join.parent_id == parent && join.child_id == child)
        };
        assert!(has(precinct, precinct));
        assert!(has(county, precinct));
        assert!(has(state, precinct));
        assert!(has(county, county));
        assert!(has(state, county));
        assert!(has(state, state));
        assert!(!has(precinct, state));
    }

    #[test]
    fn repeat_calls_reuse_the_same_units() {
        let mut store = MemoryStore::new();
        let first =
            ensure_reporting_unit(&mut store, "State;County", "county").expect("first");
        let second =
            ensure_reporting_unit(&mut store, "State;County", "county").expect("second");
        assert_eq!(first, second);
        // Pre-seeded fallback plus State and State;County.
        let units = store.reporting_units().expect("units");
        assert_eq!(units.len(), 3);
        assert!(units.iter().any(|unit| unit.name == NONE_OR_UNKNOWN));
    }
}
