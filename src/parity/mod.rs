//! OpenEthereum (Parity) `trace_*` wire format.
//!
//! This module handles:
//! - Flat call-trace elements and their action variants
//! - State-diff deltas and markers
//! - VM error translation
//! - Block reward traces
//! - Structural validation of emitted traces

pub mod diff;
pub mod errors;
pub mod reward;
pub mod trace;
pub mod validate;

// Re-export main types
pub use diff::{AccountDiff, ChangedType, Delta, Marker, StateDiff};
pub use errors::to_parity_error;
pub use reward::{reward_trace, reward_traces, BlockRewards, RewardPlacement};
pub use trace::{
    Action, CallAction, CallOutput, CallType, CreateAction, CreateOutput, CreationMethod,
    ParityTrace, ResultSlot, RewardAction, RewardType, SuicideAction, TraceOutput, TraceType,
};
pub use validate::validate_traces;
