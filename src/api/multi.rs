//! Fan-out tracer producing a combined `{trace, stateDiff}` response from one
//! event stream.

use super::config::{new_tracer, TracerKind};
use crate::hooks::{
    FrameEnter, FrameExit, HookSet, Interrupt, OpcodeStep, Receipt, Tracer, Transaction,
    VmContext,
};
use crate::state::StateReader;
use crate::utils::error::TraceError;
use alloy_primitives::Address;
use serde_json::{Map, Value};
use std::sync::Arc;

pub struct MultiTracer {
    tracers: Vec<(TracerKind, Box<dyn Tracer>)>,
    interrupt: Arc<Interrupt>,
}

impl MultiTracer {
    pub fn new(kinds: &[TracerKind]) -> Self {
        Self {
            tracers: kinds.iter().map(|kind| (*kind, new_tracer(*kind))).collect(),
            interrupt: Arc::new(Interrupt::new()),
        }
    }

    /// Call tracer and state-diff tracer together
    pub fn parity() -> Self {
        Self::new(&[TracerKind::CallParity, TracerKind::StateDiff])
    }

    pub fn kinds(&self) -> Vec<TracerKind> {
        self.tracers.iter().map(|(kind, _)| *kind).collect()
    }

    /// Forward a raised interrupt to every child
    fn propagate_stop(&self) {
        if let Some(reason) = self.interrupt.reason() {
            for (_, tracer) in &self.tracers {
                tracer.stop(&reason);
            }
        }
    }

    fn each(&mut self, wants: impl Fn(HookSet) -> bool, mut hook: impl FnMut(&mut dyn Tracer)) {
        self.propagate_stop();
        for (_, tracer) in self.tracers.iter_mut() {
            if wants(tracer.hooks()) {
                hook(tracer.as_mut());
            }
        }
    }
}

impl Tracer for MultiTracer {
    fn hooks(&self) -> HookSet {
        self.tracers
            .iter()
            .map(|(_, tracer)| tracer.hooks())
            .fold(
                HookSet {
                    tx: true,
                    frames: false,
                    opcodes: false,
                    faults: false,
                },
                HookSet::union,
            )
    }

    fn on_tx_start(
        &mut self,
        ctx: &VmContext,
        tx: &Transaction,
        from: Address,
        state: &dyn StateReader,
    ) {
        self.each(|h| h.tx, |t| t.on_tx_start(ctx, tx, from, state));
    }

    fn on_enter(&mut self, frame: &FrameEnter) {
        self.each(|h| h.frames, |t| t.on_enter(frame));
    }

    fn on_opcode(&mut self, step: &OpcodeStep, state: &dyn StateReader) {
        self.each(|h| h.opcodes, |t| t.on_opcode(step, state));
    }

    fn on_fault(&mut self, step: &OpcodeStep, state: &dyn StateReader) {
        self.each(|h| h.faults, |t| t.on_fault(step, state));
    }

    fn on_exit(&mut self, frame: &FrameExit) {
        self.each(|h| h.frames, |t| t.on_exit(frame));
    }

    fn on_tx_end(&mut self, receipt: Option<&Receipt>, error: Option<&str>, state: &dyn StateReader) {
        self.each(|h| h.tx, |t| t.on_tx_end(receipt, error, state));
    }

    /// `{"trace": [...], "stateDiff": {...}}`, keyed by each child's nested key
    fn get_result(&mut self) -> Result<Value, TraceError> {
        self.propagate_stop();
        let mut merged = Map::new();
        for (kind, tracer) in self.tracers.iter_mut() {
            merged.insert(kind.nested_key().to_string(), tracer.get_result()?);
        }
        Ok(Value::Object(merged))
    }

    fn interrupt_handle(&self) -> Arc<Interrupt> {
        Arc::clone(&self.interrupt)
    }

    fn stop(&self, reason: &str) {
        self.interrupt.stop(reason);
        self.propagate_stop();
    }
}
