//! Replay command implementation.
//!
//! The replay command:
//! 1. Loads a recorded fixture (pre state, post state, hook events)
//! 2. Replays the events into the selected tracer
//! 3. Finalizes and validates the result
//! 4. Writes the output

use super::models::{ReplayFixture, ReplaySummary};
use crate::api::{TraceConfig, TracerKind};
use crate::hooks::replay;
use crate::output::{read_json, to_json_string, write_json};
use crate::parity::validate_traces;
use crate::tracers::{CallParityTracer, StateDiffTracer};
use crate::utils::config::FIXTURE_VERSION;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for the replay command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct ReplayArgs {
    /// Fixture file to replay
    pub fixture: PathBuf,

    /// Tracer to run
    pub tracer: TracerKind,

    /// Wrap output as `{"trace": ...}` / `{"stateDiff": ...}`
    pub nested: bool,

    /// Output path (stdout when absent)
    pub output: Option<PathBuf>,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for ReplayArgs {
    fn default() -> Self {
        Self {
            fixture: PathBuf::new(),
            tracer: TracerKind::CallParity,
            nested: false,
            output: None,
            print_summary: false,
        }
    }
}

/// Execute the replay command
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `args` - Replay command arguments
///
/// # Returns
/// The (possibly nested) tracer result that was written
///
/// # Errors
/// * Fixture read or parse failures
/// * Tracer failures (invalid stream, state errors)
/// * Structural validation failures of the produced call traces
/// * File write errors
pub fn execute_replay(args: ReplayArgs) -> Result<Value> {
    let start_time = Instant::now();

    info!("Replaying fixture: {}", args.fixture.display());
    info!("Tracer: {}", args.tracer);

    // Step 1: Load fixture
    info!("Step 1/4: Loading fixture...");
    let fixture: ReplayFixture = read_json(&args.fixture)
        .with_context(|| format!("Failed to read fixture {}", args.fixture.display()))?;

    if fixture.version != FIXTURE_VERSION {
        warn!(
            "Fixture version {} differs from supported version {}",
            fixture.version, FIXTURE_VERSION
        );
    }
    debug!(
        "Fixture: {} events, {} pre accounts, {} post accounts",
        fixture.events.len(),
        fixture.pre.len(),
        fixture.post.len()
    );

    let mut summary = ReplaySummary {
        events: fixture.events.len(),
        ..Default::default()
    };

    // Steps 2 and 3: Replay and finalize
    let result = match args.tracer {
        TracerKind::CallParity => {
            info!("Step 2/4: Replaying events into call tracer...");
            let mut tracer = CallParityTracer::new();
            replay(&mut tracer, &fixture.events, &fixture.pre, &fixture.post)
                .context("Failed to replay hook events")?;

            info!("Step 3/4: Finalizing call traces...");
            let traces = tracer.traces().context("Failed to finalize call traces")?;
            if let Err(err) = validate_traces(&traces) {
                warn!("Call traces failed structural validation: {}", err);
            }

            summary.traces = traces.len();
            summary.failed_traces = traces.iter().filter(|t| t.error.is_some()).count();
            serde_json::to_value(&traces)?
        }
        TracerKind::StateDiff => {
            info!("Step 2/4: Replaying events into state-diff tracer...");
            let mut tracer = StateDiffTracer::new();
            replay(&mut tracer, &fixture.events, &fixture.pre, &fixture.post)
                .context("Failed to replay hook events")?;

            info!("Step 3/4: Computing state diff...");
            let diff = tracer.state_diff().context("Failed to compute state diff")?;

            summary.accounts = diff.len();
            serde_json::to_value(&diff)?
        }
    };

    let config = TraceConfig {
        tracer: Some(args.tracer),
        nested_trace_output: args.nested,
    };
    let result = config.wrap(args.tracer, result);

    // Step 4: Write output
    info!("Step 4/4: Writing output...");
    match &args.output {
        Some(path) => {
            write_json(&result, path).context("Failed to write trace output")?;
            info!("✓ Result written to: {}", path.display());
        }
        None => {
            println!("{}", to_json_string(&result)?);
        }
    }

    if args.print_summary {
        print_summary(&args, &summary);
    }

    let elapsed = start_time.elapsed();
    info!("Replay completed in {:.2}s", elapsed.as_secs_f64());

    Ok(result)
}

fn print_summary(args: &ReplayArgs, summary: &ReplaySummary) {
    println!("\n{}", "=".repeat(80));
    println!("REPLAY SUMMARY");
    println!("{}", "=".repeat(80));
    println!("Fixture:     {}", args.fixture.display());
    println!("Tracer:      {}", args.tracer);
    println!("Events:      {}", summary.events);
    match args.tracer {
        TracerKind::CallParity => {
            println!("Traces:      {}", summary.traces);
            println!("Failed:      {}", summary.failed_traces);
        }
        TracerKind::StateDiff => {
            println!("Accounts:    {}", summary.accounts);
        }
    }
    println!("{}", "=".repeat(80));
}

/// Validate replay arguments
///
/// **Public** - can be called before execute_replay for early validation
pub fn validate_args(args: &ReplayArgs) -> Result<()> {
    if args.fixture.as_os_str().is_empty() {
        anyhow::bail!("Fixture path cannot be empty");
    }

    if !args.fixture.is_file() {
        anyhow::bail!("Fixture not found: {}", args.fixture.display());
    }

    if let Some(output) = &args.output {
        if output == &args.fixture {
            anyhow::bail!("Output path would overwrite the fixture");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_validate_args_empty_fixture() {
        let args = ReplayArgs::default();
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_missing_fixture() {
        let args = ReplayArgs {
            fixture: PathBuf::from("/nonexistent/fixture.json"),
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_output_overwrites_fixture() {
        let fixture = NamedTempFile::new().unwrap();
        let args = ReplayArgs {
            fixture: fixture.path().to_path_buf(),
            output: Some(fixture.path().to_path_buf()),
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_valid() {
        let fixture = NamedTempFile::new().unwrap();
        let args = ReplayArgs {
            fixture: fixture.path().to_path_buf(),
            ..Default::default()
        };
        assert!(validate_args(&args).is_ok());
    }
}
