//! In-memory reference store. Backs the test suite and small command-line
//! runs; a SQL-backed session implements the same trait against real tables.

use std::collections::{BTreeMap, BTreeSet};

use cdf_model::{
    BallotMeasureSelection, Candidate, CandidateId, CandidateSelection, ComposingReportingUnitJoin,
    Contest, ContestId, ContestType, DatafileId, Election, ElectionId, LoadResult, NONE_OR_UNKNOWN,
    Party, PartyId, ReportingUnit, ReportingUnitId, SelectionId, VoteCount,
};

use crate::store::{CdfStore, ConflictMode, DatafileRecord, InsertOutcome};

#[derive(Debug, Default)]
pub struct MemoryStore {
    elections: BTreeMap<String, Election>,
    reporting_units: BTreeMap<String, ReportingUnit>,
    contests: BTreeMap<String, Contest>,
    candidates: BTreeMap<String, Candidate>,
    parties: BTreeMap<String, Party>,
    ballot_measure_selections: BTreeMap<String, BallotMeasureSelection>,
    candidate_selections: BTreeMap<(CandidateId, PartyId), CandidateSelection>,
    datafiles: BTreeMap<String, (DatafileId, DatafileRecord)>,
    vote_counts: BTreeSet<VoteCount>,
    composing_joins: BTreeSet<ComposingReportingUnitJoin>,
    next_id: i64,
}

impl MemoryStore {
    /// An empty store with the id-0 "none or unknown" fallback rows
    /// pre-seeded in every dimension table.
    pub fn new() -> Self {
        let mut store = Self {
            next_id: 1,
            ..Self::default()
        };
        store.elections.insert(
            NONE_OR_UNKNOWN.to_string(),
            Election {
                id: ElectionId::NONE_OR_UNKNOWN,
                name: NONE_OR_UNKNOWN.to_string(),
            },
        );
        store.reporting_units.insert(
            NONE_OR_UNKNOWN.to_string(),
            ReportingUnit {
                id: ReportingUnitId::NONE_OR_UNKNOWN,
                name: NONE_OR_UNKNOWN.to_string(),
                reporting_unit_type: NONE_OR_UNKNOWN.to_string(),
            },
        );
        store.contests.insert(
            NONE_OR_UNKNOWN.to_string(),
            Contest {
                id: ContestId::NONE_OR_UNKNOWN,
                name: NONE_OR_UNKNOWN.to_string(),
                contest_type: ContestType::Candidate,
            },
        );
        store.candidates.insert(
            NONE_OR_UNKNOWN.to_string(),
            Candidate {
                id: CandidateId::NONE_OR_UNKNOWN,
                name: NONE_OR_UNKNOWN.to_string(),
            },
        );
        store.parties.insert(
            NONE_OR_UNKNOWN.to_string(),
            Party {
                id: PartyId::NONE_OR_UNKNOWN,
                name: NONE_OR_UNKNOWN.to_string(),
            },
        );
        store.ballot_measure_selections.insert(
            NONE_OR_UNKNOWN.to_string(),
            BallotMeasureSelection {
                id: SelectionId::NONE_OR_UNKNOWN,
                name: NONE_OR_UNKNOWN.to_string(),
            },
        );
        store.candidate_selections.insert(
            (CandidateId::NONE_OR_UNKNOWN, PartyId::NONE_OR_UNKNOWN),
            CandidateSelection {
                id: SelectionId::NONE_OR_UNKNOWN,
                candidate_id: CandidateId::NONE_OR_UNKNOWN,
                party_id: PartyId::NONE_OR_UNKNOWN,
            },
        );
        store
    }

    fn take_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn add_election(&mut self, name: &str) -> ElectionId {
        if let Some(existing) = self.elections.get(name) {
            return existing.id;
        }
        let id = ElectionId(self.take_id());
        self.elections.insert(
            name.to_string(),
            Election {
                id,
                name: name.to_string(),
            },
        );
        id
    }

    pub fn add_contest(&mut self, name: &str, contest_type: ContestType) -> ContestId {
        if let Some(existing) = self.contests.get(name) {
            return existing.id;
        }
        let id = ContestId(self.take_id());
        self.contests.insert(
            name.to_string(),
            Contest {
                id,
                name: name.to_string(),
                contest_type,
            },
        );
        id
    }

    pub fn add_candidate(&mut self, name: &str) -> CandidateId {
        if let Some(existing) = self.candidates.get(name) {
            return existing.id;
        }
        let id = CandidateId(self.take_id());
        self.candidates.insert(
            name.to_string(),
            Candidate {
                id,
                name: name.to_string(),
            },
        );
        id
    }

    pub fn add_party(&mut self, name: &str) -> PartyId {
        if let Some(existing) = self.parties.get(name) {
            return existing.id;
        }
        let id = PartyId(self.take_id());
        self.parties.insert(
            name.to_string(),
            Party {
                id,
                name: name.to_string(),
            },
        );
        id
    }

    pub fn add_ballot_measure_selection(&mut self, name: &str) -> SelectionId {
        if let Some(existing) = self.ballot_measure_selections.get(name) {
            return existing.id;
        }
        let id = SelectionId(self.take_id());
        self.ballot_measure_selections.insert(
            name.to_string(),
            BallotMeasureSelection {
                id,
                name: name.to_string(),
            },
        );
        id
    }
}

impl CdfStore for MemoryStore {
    fn election_id(&self, name: &str) -> LoadResult<Option<ElectionId>> {
        Ok(self.elections.get(name).map(|election| election.id))
    }

    fn reporting_unit_id(&self, name: &str) -> LoadResult<Option<ReportingUnitId>> {
        Ok(self.reporting_units.get(name).map(|unit| unit.id))
    }

    fn contest_id(&self, name: &str) -> LoadResult<Option<ContestId>> {
        Ok(self.contests.get(name).map(|contest| contest.id))
    }

    fn candidate_id(&self, name: &str) -> LoadResult<Option<CandidateId>> {
        Ok(self.candidates.get(name).map(|candidate| candidate.id))
    }

    fn party_id(&self, name: &str) -> LoadResult<Option<PartyId>> {
        Ok(self.parties.get(name).map(|party| party.id))
    }

    fn ballot_measure_selection_id(&self, name: &str) -> LoadResult<Option<SelectionId>> {
        Ok(self
            .ballot_measure_selections
            .get(name)
            .map(|selection| selection.id))
    }

    fn contests(&self) -> LoadResult<Vec<Contest>> {
        Ok(self.contests.values().cloned().collect())
    }

    fn reporting_units(&self) -> LoadResult<Vec<ReportingUnit>> {
        Ok(self.reporting_units.values().cloned().collect())
    }

    fn candidate_selections(&self) -> LoadResult<Vec<CandidateSelection>> {
        Ok(self.candidate_selections.values().copied().collect())
    }

    fn ballot_measure_selections(&self) -> LoadResult<Vec<BallotMeasureSelection>> {
        Ok(self.ballot_measure_selections.values().cloned().collect())
    }

    fn composing_joins(&self) -> LoadResult<Vec<ComposingReportingUnitJoin>> {
        Ok(self.composing_joins.iter().copied().collect())
    }

    fn vote_counts(&self) -> LoadResult<Vec<VoteCount>> {
        Ok(self.vote_counts.iter().cloned().collect())
    }

    fn find_or_create_reporting_unit(
        &mut self,
        name: &str,
        reporting_unit_type: &str,
    ) -> LoadResult<ReportingUnitId> {
        if let Some(existing) = self.reporting_units.get(name) {
            return Ok(existing.id);
        }
        let id = ReportingUnitId(self.take_id());
        self.reporting_units.insert(
            name.to_string(),
            ReportingUnit {
                id,
                name: name.to_string(),
                reporting_unit_type: reporting_unit_type.to_string(),
            },
        );
        Ok(id)
    }

    fn find_or_create_candidate_selection(
        &mut self,
        candidate_id: CandidateId,
        party_id: PartyId,
    ) -> LoadResult<SelectionId> {
        if let Some(existing) = self.candidate_selections.get(&(candidate_id, party_id)) {
            return Ok(existing.id);
        }
        let id = SelectionId(self.take_id());
        self.candidate_selections.insert(
            (candidate_id, party_id),
            CandidateSelection {
                id,
                candidate_id,
                party_id,
            },
        );
        Ok(id)
    }

    fn register_datafile(&mut self, record: DatafileRecord) -> LoadResult<DatafileId> {
        if let Some((id, _)) = self.datafiles.get(&record.short_name) {
            return Ok(*id);
        }
        let id = DatafileId(self.take_id());
        self.datafiles.insert(record.short_name.clone(), (id, record));
        Ok(id)
    }

    fn insert_vote_counts(
        &mut self,
        rows: &[VoteCount],
        mode: ConflictMode,
    ) -> LoadResult<InsertOutcome> {
        let mut outcome = InsertOutcome::default();
        for row in rows {
            match mode {
                ConflictMode::InsertIgnore => {
                    if self.vote_counts.insert(row.clone()) {
                        outcome.inserted += 1;
                    } else {
                        outcome.skipped += 1;
                    }
                }
                ConflictMode::Upsert => {
                    let key = row.dimension_key();
                    let existing = self
                        .vote_counts
                        .iter()
                        .find(|candidate| candidate.dimension_key() == key)
                        .cloned();
                    match existing {
                        Some(old) if old.count == row.count => outcome.skipped += 1,
                        Some(old) => {
                            self.vote_counts.remove(&old);
                            self.vote_counts.insert(row.clone());
                            outcome.updated += 1;
                        }
                        None => {
                            self.vote_counts.insert(row.clone());
                            outcome.inserted += 1;
                        }
                    }
                }
            }
        }
        Ok(outcome)
    }

    fn insert_composing_joins(
        &mut self,
        rows: &[ComposingReportingUnitJoin],
    ) -> LoadResult<usize> {
        let mut inserted = 0;
        for row in rows {
            if self.composing_joins.insert(*row) {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn remove_vote_counts(
        &mut self,
        election_id: ElectionId,
        jurisdiction_id: ReportingUnitId,
    ) -> LoadResult<usize> {
        let inside: BTreeSet<ReportingUnitId> = self
            .composing_joins
            .iter()
            .filter(|join| join.parent_id == jurisdiction_id)
            .map(|join| join.child_id)
            .collect();
        let before = self.vote_counts.len();
        self.vote_counts.retain(|row| {
            row.election_id != election_id || !inside.contains(&row.reporting_unit_id)
        });
        Ok(before - self.vote_counts.len())
    }
}
