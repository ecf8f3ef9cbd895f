//! Parity-compatible tracers.
//!
//! This module handles:
//! - Call-tree capture and flattening (`callTracerParity`)
//! - Lazy pre/post state capture
//! - Account delta computation (`stateDiffTracer`)

pub mod call_parity;
pub mod prestate;
pub mod state_diff;

// Re-export main types
pub use call_parity::CallParityTracer;
pub use prestate::PrestateTracer;
pub use state_diff::StateDiffTracer;
