use crate::output::read_json;
use crate::parity::{validate_traces, ParityTrace};
use crate::utils::config::{FIXTURE_VERSION, NESTED_TRACE_KEY};
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

/// Validate a trace JSON file (flat list or nested `{"trace": [...]}`)
///
/// **Public** - backs the `validate` command
///
/// # Returns
/// Number of traces checked
pub fn validate_trace_file(file_path: &Path) -> Result<usize> {
    println!("Validating traces: {}", file_path.display());

    let mut document: Value = read_json(file_path)
        .with_context(|| format!("Failed to read {}", file_path.display()))?;

    let list = if document.get(NESTED_TRACE_KEY).is_some() {
        document[NESTED_TRACE_KEY].take()
    } else {
        document
    };
    let traces: Vec<ParityTrace> =
        serde_json::from_value(list).context("File is not a Parity trace list")?;

    validate_traces(&traces).context("Trace list failed structural validation")?;

    let failed = traces.iter().filter(|t| t.error.is_some()).count();
    let roots = traces.iter().filter(|t| t.trace_address.is_empty()).count();

    println!("✓ Valid trace list");
    println!("  Traces: {}", traces.len());
    println!("  Top-level: {}", roots);
    println!("  Failed: {}", failed);

    Ok(traces.len())
}

/// Display version information
pub fn display_version() {
    println!("Parity Trace v{}", env!("CARGO_PKG_VERSION"));
    println!("Fixture Format: v{}", FIXTURE_VERSION);
    println!();
    println!("OpenEthereum-compatible call traces and state diffs from EVM hook streams.");
}
