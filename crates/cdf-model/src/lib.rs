pub mod diagnostics;
pub mod entities;
pub mod enums;
pub mod error;
pub mod ids;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use entities::{
    BallotMeasureSelection, Candidate, CandidateSelection, ComposingReportingUnitJoin, Contest,
    Election, NONE_OR_UNKNOWN, Party, ROW_SHOULD_BE_DROPPED, ReportingUnit, VoteCount,
};
pub use enums::{
    CdfElement, ContestType, CountLocation, FileType, NIST_COUNT_ITEM_TYPES,
    TOTAL_COUNT_ITEM_TYPE, is_nist_count_item_type,
};
pub use error::{ErrorCategory, LoadError, LoadResult};
pub use ids::{
    CandidateId, ContestId, DatafileId, ElectionId, PartyId, ReportingUnitId, SelectionId,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_count_dimension_key_excludes_count() {
        let a = VoteCount {
            election_id: ElectionId(1),
            reporting_unit_id: ReportingUnitId(2),
            contest_id: ContestId(3),
            selection_id: SelectionId(4),
            count_item_type: "election-day".to_string(),
            count: 60,
            datafile_id: DatafileId(5),
        };
        let mut b = a.clone();
        b.count = 61;
        assert_eq!(a.dimension_key(), b.dimension_key());
        assert_ne!(a, b);
    }

    #[test]
    fn diagnostics_serialize() {
        let mut diags = Diagnostics::new();
        diags.warn(ErrorCategory::Jurisdiction, "Candidate", "unmatched: X. Y. Z.");
        let json = serde_json::to_string(&diags).expect("serialize diagnostics");
        let round: Diagnostics = serde_json::from_str(&json).expect("deserialize diagnostics");
        assert_eq!(round.warning_count(), 1);
    }
}
