//! Persisted CDF entities as the store trait exposes them.

use serde::{Deserialize, Serialize};

use crate::enums::ContestType;
use crate::ids::{
    CandidateId, ContestId, DatafileId, ElectionId, PartyId, ReportingUnitId, SelectionId,
};

/// Internal name used when a raw value cannot be resolved but the row is kept.
pub const NONE_OR_UNKNOWN: &str = "none or unknown";

/// Reserved dictionary internal name signalling deliberate exclusion.
pub const ROW_SHOULD_BE_DROPPED: &str = "row should be dropped";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingUnit {
    pub id: ReportingUnitId,
    /// Nesting is encoded in the name with semicolon-delimited segments,
    /// e.g. `Georgia;Fulton County;Precinct 4`.
    pub name: String,
    pub reporting_unit_type: String,
}

impl ReportingUnit {
    /// Name segments from outermost to innermost.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.name.split(';')
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    pub id: ElectionId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contest {
    pub id: ContestId,
    pub name: String,
    pub contest_type: ContestType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub id: PartyId,
    pub name: String,
}

/// A Candidate×Party pair in a candidate contest. The natural key is
/// `(candidate_id, party_id)`; creation is find-or-create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSelection {
    pub id: SelectionId,
    pub candidate_id: CandidateId,
    pub party_id: PartyId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotMeasureSelection {
    pub id: SelectionId,
    pub name: String,
}

/// One resolved, persisted vote count at the VoteCount grain.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VoteCount {
    pub election_id: ElectionId,
    pub reporting_unit_id: ReportingUnitId,
    pub contest_id: ContestId,
    pub selection_id: SelectionId,
    /// Text vote type (NIST vocabulary when standard), not an id.
    pub count_item_type: String,
    pub count: i64,
    pub datafile_id: DatafileId,
}

impl VoteCount {
    /// The dimension tuple without the count. Upsert mode conflicts on this
    /// key; insert-ignore mode conflicts on the full row (dimensions plus
    /// count), per the loader contract.
    pub fn dimension_key(
        &self,
    ) -> (
        ElectionId,
        ReportingUnitId,
        ContestId,
        SelectionId,
        String,
        DatafileId,
    ) {
        (
            self.election_id,
            self.reporting_unit_id,
            self.contest_id,
            self.selection_id,
            self.count_item_type.clone(),
            self.datafile_id,
        )
    }
}

/// Ancestor/descendant closure row over ReportingUnit names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComposingReportingUnitJoin {
    pub parent_id: ReportingUnitId,
    pub child_id: ReportingUnitId,
}
