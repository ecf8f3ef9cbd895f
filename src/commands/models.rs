use crate::hooks::HookEvent;
use crate::state::InMemoryState;
use crate::utils::config::FIXTURE_VERSION;
use serde::{Deserialize, Serialize};

/// A recorded transaction: state before and after, plus the hook stream
///
/// **Public** - input of the `replay` command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayFixture {
    /// Fixture format version (e.g., '1.0.0')
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub pre: InMemoryState,

    #[serde(default)]
    pub post: InMemoryState,

    pub events: Vec<HookEvent>,
}

fn default_version() -> String {
    FIXTURE_VERSION.to_string()
}

/// Counts printed by `replay --summary`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub events: usize,
    pub traces: usize,
    pub failed_traces: usize,
    pub accounts: usize,
}
