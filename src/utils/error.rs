//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors surfaced by a tracer from `get_result`
///
/// Per-frame VM failures are data (they land in a trace's `error` field);
/// these variants describe why a whole trace could not be produced.
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("VM error: {0}")]
    Vm(String),

    #[error("invalid trace: {0}")]
    InvalidTrace(String),

    #[error("state access failed: {0}")]
    StateAccess(#[from] StateError),

    /// `stop` was called; `partial` holds whatever had been collected
    #[error("tracing interrupted: {reason}")]
    Interrupted {
        reason: String,
        partial: Option<serde_json::Value>,
    },

    #[error("failed to serialize trace: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown tracer: {0}")]
    UnknownTracer(String),
}

impl TraceError {
    /// Shorthand for structural failures
    pub fn invalid(msg: impl Into<String>) -> Self {
        TraceError::InvalidTrace(msg.into())
    }
}

/// Errors raised by a host state view
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("state unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
