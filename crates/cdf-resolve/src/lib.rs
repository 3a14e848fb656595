//! Dictionary resolution: raw values → internal names → store ids.

pub mod contests;
pub mod count_item_type;
pub mod dictionary_join;
pub mod selections;

pub use contests::{
    BALLOT_MEASURE_CONTEST, CANDIDATE_CONTEST, CONTEST_COLUMN, CONTEST_TYPE_COLUMN,
    resolve_contests,
};
pub use count_item_type::audit_count_item_types;
pub use dictionary_join::{resolve_element, resolve_names};
pub use selections::build_vote_counts;
