//! Per-file load report, serializable for callers that archive results.

use serde::{Deserialize, Serialize};

use cdf_model::{Diagnostics, LoadResult};
use cdf_store::InsertOutcome;

/// Stages of one results-file load. `Errored` is absorbing: a fatal error at
/// any stage lands here and nothing is written to VoteCount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Configured,
    Read,
    Standardized,
    FormulasApplied,
    DictionaryResolved,
    Aggregated,
    Loaded,
    Errored,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoadReport {
    pub short_name: String,
    pub results_file: String,
    pub stage_reached: Stage,
    /// Rows that survived resolution, before aggregation.
    pub rows_resolved: usize,
    /// Present only when the final write ran.
    pub outcome: Option<InsertOutcome>,
    pub diagnostics: Diagnostics,
}

impl LoadReport {
    pub fn succeeded(&self) -> bool {
        self.stage_reached == Stage::Loaded
    }

    pub fn to_json(&self) -> LoadResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|error| cdf_model::LoadError::system("report", error.to_string()))
    }
}
