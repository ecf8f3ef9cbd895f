//! Output writers for trace results.
//!
//! This module handles writing data to disk:
//! - JSON trace lists, state diffs and nested responses
//! - Reading fixtures and trace files back

pub mod json;

// Re-export main functions
pub use json::{read_json, to_json_string, write_json};
