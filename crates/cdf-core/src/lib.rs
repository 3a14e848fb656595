//! End-to-end load orchestration for results files.

pub mod pipeline;
pub mod report;

pub use pipeline::{LoadRequest, load_results_file, remove_election_results};
pub use report::{LoadReport, Stage};
