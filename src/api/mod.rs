//! Data-level `trace_*` surface.
//!
//! This module handles:
//! - Tracer selection and nested output (`TraceConfig`)
//! - Running several tracers over one stream (`MultiTracer`)
//! - Block assembly with reward traces

pub mod block;
pub mod config;
pub mod multi;

// Re-export main types
pub use block::{assemble_block, TxTraces};
pub use config::{new_tracer, trace_events, TraceConfig, TracerKind};
pub use multi::MultiTracer;
