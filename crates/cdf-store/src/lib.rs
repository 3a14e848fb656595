//! Database boundary and the aggregator/loader.
//!
//! The pipeline talks to persistence only through [`CdfStore`]. The
//! [`MemoryStore`] reference implementation backs tests and small runs.

pub mod loader;
pub mod memory;
pub mod reporting_units;
pub mod rollup;
pub mod store;

pub use loader::{group_and_sum, load_vote_counts, missing_total_counts};
pub use memory::MemoryStore;
pub use reporting_units::{ancestor_names, ensure_reporting_unit};
pub use rollup::{RollupRow, TotalsMismatch, check_totals_match_vote_types, rollup};
pub use store::{CdfStore, ConflictMode, DatafileRecord, InsertOutcome};
