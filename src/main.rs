//! Parity Trace CLI
//!
//! Replays recorded EVM hook streams through the Parity-compatible tracers
//! and validates emitted trace lists.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use parity_trace::api::TracerKind;
use parity_trace::commands::{
    display_version, execute_replay, validate_args, validate_trace_file, ReplayArgs,
};
use parity_trace::utils::config::CALL_TRACER_PARITY;

/// Parity Trace - OpenEthereum-style traces from EVM hook streams
#[derive(Parser, Debug)]
#[command(name = "parity-trace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a recorded transaction through a tracer
    Replay {
        /// Fixture with pre state, post state and hook events
        #[arg(short, long)]
        fixture: PathBuf,

        /// Tracer name (callTracerParity, callParityTracer, stateDiffTracer)
        #[arg(short, long, default_value = CALL_TRACER_PARITY)]
        tracer: TracerKind,

        /// Wrap output under "trace" / "stateDiff"
        #[arg(long)]
        nested: bool,

        /// Output path for the JSON result (stdout if omitted)
        #[arg(short, long, env = "PARITY_TRACE_OUTPUT")]
        output: Option<PathBuf>,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Validate a Parity trace JSON file
    Validate {
        /// Path to trace JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Replay {
            fixture,
            tracer,
            nested,
            output,
            summary,
        } => {
            let args = ReplayArgs {
                fixture,
                tracer,
                nested,
                output,
                print_summary: summary,
            };

            // Validate args first
            validate_args(&args)?;

            execute_replay(args)?;
        }

        Commands::Validate { file } => {
            validate_trace_file(&file)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
