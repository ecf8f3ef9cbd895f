//! Configuration and constants shared by the tracers and the CLI.

/// Registered name of the Parity call tracer
pub const CALL_TRACER_PARITY: &str = "callTracerParity";

/// Legacy registration name still accepted for the call tracer
pub const CALL_TRACER_PARITY_ALIAS: &str = "callParityTracer";

/// Registered name of the state-diff tracer
pub const STATE_DIFF_TRACER: &str = "stateDiffTracer";

/// Key used for call traces in nested output
pub const NESTED_TRACE_KEY: &str = "trace";

/// Key used for state diffs in nested output
pub const NESTED_STATE_DIFF_KEY: &str = "stateDiff";

/// Maximum EVM call depth; bounds the frame stack
pub const MAX_CALL_DEPTH: usize = 1024;

/// Version of the replay fixture format understood by the CLI
pub const FIXTURE_VERSION: &str = "1.0.0";
