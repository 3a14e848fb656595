//! The narrow session interface the pipeline needs from a backing database.

use serde::{Deserialize, Serialize};

use cdf_model::{
    BallotMeasureSelection, CandidateId, CandidateSelection, ComposingReportingUnitJoin, Contest,
    ContestId, DatafileId, ElectionId, LoadResult, PartyId, ReportingUnit, ReportingUnitId,
    SelectionId, VoteCount,
};

/// Conflict handling for bulk VoteCount inserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictMode {
    /// Skip rows whose full tuple (dimensions plus count) already exists.
    /// Reloading the same file is a no-op under this mode.
    #[default]
    InsertIgnore,
    /// Replace the count of rows whose dimension tuple already exists.
    Upsert,
}

/// What a bulk insert did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOutcome {
    pub inserted: usize,
    pub skipped: usize,
    pub updated: usize,
}

/// Metadata recorded for one loaded results file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatafileRecord {
    pub short_name: String,
    pub file_name: String,
    pub download_date: String,
    pub source: String,
    pub note: String,
    pub election_id: ElectionId,
    pub jurisdiction_id: ReportingUnitId,
}

/// One database session. Name lookups are exact-match over names that have
/// already been whitespace compressed upstream. Find-or-create operations
/// conflict on the natural key and re-select, so repeating them is safe
/// within a load.
pub trait CdfStore {
    fn election_id(&self, name: &str) -> LoadResult<Option<ElectionId>>;
    fn reporting_unit_id(&self, name: &str) -> LoadResult<Option<ReportingUnitId>>;
    fn contest_id(&self, name: &str) -> LoadResult<Option<ContestId>>;
    fn candidate_id(&self, name: &str) -> LoadResult<Option<CandidateId>>;
    fn party_id(&self, name: &str) -> LoadResult<Option<PartyId>>;
    fn ballot_measure_selection_id(&self, name: &str) -> LoadResult<Option<SelectionId>>;

    fn contests(&self) -> LoadResult<Vec<Contest>>;
    fn reporting_units(&self) -> LoadResult<Vec<ReportingUnit>>;
    fn candidate_selections(&self) -> LoadResult<Vec<CandidateSelection>>;
    fn ballot_measure_selections(&self) -> LoadResult<Vec<BallotMeasureSelection>>;
    fn composing_joins(&self) -> LoadResult<Vec<ComposingReportingUnitJoin>>;
    fn vote_counts(&self) -> LoadResult<Vec<VoteCount>>;

    /// Natural key: Name. Newly created units get the given type.
    fn find_or_create_reporting_unit(
        &mut self,
        name: &str,
        reporting_unit_type: &str,
    ) -> LoadResult<ReportingUnitId>;

    /// Natural key: (candidate_id, party_id).
    fn find_or_create_candidate_selection(
        &mut self,
        candidate_id: CandidateId,
        party_id: PartyId,
    ) -> LoadResult<SelectionId>;

    /// Natural key: short_name. Re-registering an already-loaded file
    /// returns its existing id.
    fn register_datafile(&mut self, record: DatafileRecord) -> LoadResult<DatafileId>;

    fn insert_vote_counts(
        &mut self,
        rows: &[VoteCount],
        mode: ConflictMode,
    ) -> LoadResult<InsertOutcome>;

    fn insert_composing_joins(
        &mut self,
        rows: &[ComposingReportingUnitJoin],
    ) -> LoadResult<usize>;

    /// Delete every VoteCount for the election whose reporting unit sits
    /// inside the given jurisdiction per the name-nesting closure.
    fn remove_vote_counts(
        &mut self,
        election_id: ElectionId,
        jurisdiction_id: ReportingUnitId,
    ) -> LoadResult<usize>;
}
