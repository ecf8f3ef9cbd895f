//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod models;
pub mod replay;
pub mod validate;

// Re-export main command functions
pub use models::{ReplayFixture, ReplaySummary};
pub use replay::{execute_replay, validate_args, ReplayArgs};
pub use validate::{display_version, validate_trace_file};
