//! Hook dispatcher: the narrow boundary through which a host VM pushes
//! lifecycle events into a tracer.
//!
//! This module handles:
//! - The [`Tracer`] capability trait (every hook is optional)
//! - Hook payloads and the ambient [`VmContext`]
//! - Cross-thread interruption via [`Interrupt`]
//! - Dispatching a recorded [`HookEvent`] stream into a tracer
//!
//! # Ordering contract
//! `on_tx_start` precedes every frame event and `on_tx_end` follows them.
//! Each `on_enter` at depth *d* is matched by exactly one `on_exit` at depth
//! *d*, in LIFO order, with only deeper events in between.

pub mod context;
pub mod dispatcher;
pub mod events;
pub mod interrupt;
pub mod opcode;

pub use context::{Receipt, Transaction, VmContext};
pub use dispatcher::{dispatch, replay};
pub use events::{FrameEnter, FrameExit, HookEvent, OpcodeStep, ScopeContext};
pub use interrupt::Interrupt;
pub use opcode::OpCode;

use crate::state::StateReader;
use crate::utils::error::TraceError;
use alloy_primitives::Address;
use std::sync::Arc;

/// Which hooks a tracer actually consumes
///
/// Hosts may skip invoking hooks a tracer does not list; per-opcode hooks
/// are the expensive ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookSet {
    pub tx: bool,
    pub frames: bool,
    pub opcodes: bool,
    pub faults: bool,
}

impl HookSet {
    pub const ALL: HookSet = HookSet {
        tx: true,
        frames: true,
        opcodes: true,
        faults: true,
    };

    /// Transaction and frame hooks only
    pub const FRAMES: HookSet = HookSet {
        tx: true,
        frames: true,
        opcodes: false,
        faults: false,
    };

    pub fn union(self, other: HookSet) -> HookSet {
        HookSet {
            tx: self.tx || other.tx,
            frames: self.frames || other.frames,
            opcodes: self.opcodes || other.opcodes,
            faults: self.faults || other.faults,
        }
    }
}

/// A transaction tracer driven by VM lifecycle events
///
/// One instance traces exactly one transaction. Hooks are invoked
/// synchronously from the execution thread; only [`Tracer::stop`] may be
/// called from elsewhere (through the shared [`Interrupt`]).
pub trait Tracer {
    /// Hooks this tracer wants to receive
    fn hooks(&self) -> HookSet {
        HookSet::ALL
    }

    fn on_tx_start(
        &mut self,
        _ctx: &VmContext,
        _tx: &Transaction,
        _from: Address,
        _state: &dyn StateReader,
    ) {
    }

    fn on_enter(&mut self, _frame: &FrameEnter) {}

    fn on_opcode(&mut self, _step: &OpcodeStep, _state: &dyn StateReader) {}

    fn on_fault(&mut self, _step: &OpcodeStep, _state: &dyn StateReader) {}

    fn on_exit(&mut self, _frame: &FrameExit) {}

    fn on_tx_end(
        &mut self,
        _receipt: Option<&Receipt>,
        _error: Option<&str>,
        _state: &dyn StateReader,
    ) {
    }

    /// Finalize and serialize the result
    ///
    /// Idempotent; once called, further events are ignored.
    fn get_result(&mut self) -> Result<serde_json::Value, TraceError>;

    /// Shared interruption flag
    fn interrupt_handle(&self) -> Arc<Interrupt>;

    /// Abort tracing; subsequent hooks become no-ops
    fn stop(&self, reason: &str) {
        self.interrupt_handle().stop(reason);
    }
}
