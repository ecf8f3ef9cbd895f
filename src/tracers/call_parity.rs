//! Parity-style call tracer.
//!
//! Rebuilds the call tree from frame enter/exit events on an explicit stack,
//! then flattens it depth-first into OpenEthereum trace elements:
//! - CREATE/CREATE2 become `create` traces (`init`, `result.address`, `result.code`)
//! - SELFDESTRUCT becomes a `suicide` trace
//! - the CALL family becomes `call` traces tagged with `callType`
//!
//! Direct CALL/STATICCALL invocations of precompiles are elided.

use crate::hooks::{
    FrameEnter, FrameExit, HookSet, Interrupt, OpCode, Receipt, Tracer, Transaction, VmContext,
};
use crate::parity::{
    to_parity_error, Action, CallAction, CallOutput, CallType, CreateAction, CreateOutput,
    CreationMethod, ParityTrace, ResultSlot, SuicideAction, TraceOutput,
};
use crate::state::StateReader;
use crate::utils::config::MAX_CALL_DEPTH;
use crate::utils::error::TraceError;
use alloy_primitives::{Address, Bytes, U256, U64};
use log::{debug, warn};
use std::collections::HashSet;
use std::sync::Arc;

/// Opcode that opened a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
    Create,
    Create2,
    SelfDestruct,
}

impl FrameKind {
    fn from_opcode(op: OpCode) -> Option<Self> {
        match op {
            OpCode::CALL => Some(FrameKind::Call),
            OpCode::CALLCODE => Some(FrameKind::CallCode),
            OpCode::DELEGATECALL => Some(FrameKind::DelegateCall),
            OpCode::STATICCALL => Some(FrameKind::StaticCall),
            OpCode::CREATE => Some(FrameKind::Create),
            OpCode::CREATE2 => Some(FrameKind::Create2),
            OpCode::SELFDESTRUCT => Some(FrameKind::SelfDestruct),
            _ => None,
        }
    }

    fn is_create(self) -> bool {
        matches!(self, FrameKind::Create | FrameKind::Create2)
    }

    /// Delegated calls share the caller's value context
    fn inherits_value(self) -> bool {
        matches!(self, FrameKind::DelegateCall | FrameKind::StaticCall)
    }
}

/// A call frame while the tree is being built
#[derive(Debug, Clone)]
struct CallFrame {
    kind: FrameKind,
    from: Address,
    /// Callee, created contract, or refund recipient; dropped for failed creations
    to: Option<Address>,
    input: Bytes,
    value: U256,
    gas: u64,
    gas_used: u64,
    output: Bytes,
    error: Option<String>,
    children: Vec<CallFrame>,
}

impl CallFrame {
    fn new(kind: FrameKind, from: Address, to: Address, input: Bytes, gas: u64, value: U256) -> Self {
        Self {
            kind,
            from,
            to: Some(to),
            input,
            value,
            gas,
            gas_used: 0,
            output: Bytes::new(),
            error: None,
            children: Vec::new(),
        }
    }

    fn fail(&mut self, error: &str) {
        self.error = Some(error.to_string());
        if self.kind.is_create() {
            self.to = None;
        }
    }

    fn close(&mut self, exit: &FrameExit) {
        self.gas_used = exit.gas_used;
        match exit.error_message() {
            None => self.output = exit.output.clone(),
            Some(err) => self.fail(err),
        }
    }

    fn to_parity(&self, trace_address: Vec<usize>, value: U256) -> ParityTrace {
        let error = self.error.as_deref().map(to_parity_error);
        let gas = U64::from(self.gas);
        let gas_used = U64::from(self.gas_used);

        let (action, result) = match self.kind {
            FrameKind::Create | FrameKind::Create2 => {
                let creation_method = if self.kind == FrameKind::Create2 {
                    CreationMethod::Create2
                } else {
                    CreationMethod::Create
                };
                let result = match (&error, self.to) {
                    (None, Some(address)) => ResultSlot::Output(TraceOutput::Create(CreateOutput {
                        address,
                        code: self.output.clone(),
                        gas_used,
                    })),
                    (None, None) => {
                        warn!("Successful creation without an address at {:?}", trace_address);
                        ResultSlot::Omitted
                    }
                    _ => ResultSlot::Omitted,
                };
                let action = Action::Create(CreateAction {
                    creation_method,
                    from: self.from,
                    value,
                    gas,
                    init: self.input.clone(),
                });
                (action, result)
            }
            FrameKind::SelfDestruct => {
                let action = Action::Suicide(SuicideAction {
                    address: self.from,
                    refund_address: self.to.unwrap_or_default(),
                    balance: value,
                });
                (action, ResultSlot::Null)
            }
            kind => {
                let call_type = match kind {
                    FrameKind::CallCode => CallType::CallCode,
                    FrameKind::DelegateCall => CallType::DelegateCall,
                    FrameKind::StaticCall => CallType::StaticCall,
                    _ => CallType::Call,
                };
                let result = if error.is_none() {
                    ResultSlot::Output(TraceOutput::Call(CallOutput {
                        gas_used,
                        output: self.output.clone(),
                    }))
                } else {
                    ResultSlot::Omitted
                };
                let action = Action::Call(CallAction {
                    call_type,
                    from: self.from,
                    to: self.to.unwrap_or_default(),
                    value,
                    gas,
                    input: self.input.clone(),
                });
                (action, result)
            }
        };

        let mut trace = ParityTrace::new(action, result, error);
        trace.subtraces = self.children.len();
        trace.trace_address = trace_address;
        trace
    }
}

/// Pre-order walk producing trace addresses and inherited values
fn flatten(root: &CallFrame) -> Vec<ParityTrace> {
    let mut traces = Vec::new();
    let mut pending: Vec<(&CallFrame, Vec<usize>, U256)> = vec![(root, Vec::new(), U256::ZERO)];

    while let Some((frame, trace_address, parent_value)) = pending.pop() {
        let value = if frame.kind.inherits_value() && frame.value.is_zero() {
            parent_value
        } else {
            frame.value
        };

        // Reverse so the first child is popped first
        for (index, child) in frame.children.iter().enumerate().rev() {
            let mut child_address = trace_address.clone();
            child_address.push(index);
            pending.push((child, child_address, value));
        }

        traces.push(frame.to_parity(trace_address, value));
    }

    traces
}

/// Tracer emitting the flat Parity call-trace list for one transaction
#[derive(Debug, Default)]
pub struct CallParityTracer {
    callstack: Vec<CallFrame>,
    precompiles: HashSet<Address>,
    /// Depths of elided precompile frames awaiting their exit
    skipped: Vec<usize>,
    started: bool,
    root_entered: bool,
    root_closed: bool,
    ended: bool,
    anomaly: Option<String>,
    /// Set when the transaction failed before execution (no receipt)
    rejected: Option<String>,
    finalized: Option<Vec<ParityTrace>>,
    interrupt: Arc<Interrupt>,
}

impl CallParityTracer {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_precompiled(&self, address: &Address) -> bool {
        self.precompiles.contains(address)
    }

    /// Hooks run only while not interrupted and not yet finalized
    fn accepting(&self) -> bool {
        if self.interrupt.is_raised() {
            return false;
        }
        if self.finalized.is_some() {
            warn!("Event received after the call trace was finalized; ignoring");
            return false;
        }
        true
    }

    fn record_anomaly(&mut self, msg: String) {
        warn!("Call trace anomaly: {}", msg);
        if self.anomaly.is_none() {
            self.anomaly = Some(msg);
        }
    }

    /// Fold still-open frames into their parents and flatten what exists
    fn partial_traces(&self) -> Vec<ParityTrace> {
        let mut stack = self.callstack.clone();
        while stack.len() > 1 {
            if let Some(frame) = stack.pop() {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(frame);
                }
            }
        }
        stack.first().map(flatten).unwrap_or_default()
    }

    /// Finalize into typed trace elements
    ///
    /// **Public** - typed counterpart of `get_result`
    ///
    /// # Errors
    /// * `TraceError::Interrupted` - `stop` was called; carries the partial list
    /// * `TraceError::InvalidTrace` - no transaction, mismatched enter/exit, or
    ///   frames still open
    /// * `TraceError::Vm` - the transaction was rejected before execution
    pub fn traces(&mut self) -> Result<Vec<ParityTrace>, TraceError> {
        if let Some(traces) = &self.finalized {
            return Ok(traces.clone());
        }

        if let Some(reason) = self.interrupt.reason() {
            let partial = serde_json::to_value(self.partial_traces()).ok();
            return Err(TraceError::Interrupted { reason, partial });
        }
        if !self.started {
            return Err(TraceError::invalid("no transaction was traced"));
        }
        if let Some(anomaly) = &self.anomaly {
            return Err(TraceError::invalid(anomaly.clone()));
        }
        if let Some(err) = &self.rejected {
            return Err(TraceError::Vm(err.clone()));
        }
        if self.callstack.len() != 1 {
            return Err(TraceError::invalid(format!(
                "incorrect number of top-level calls: {}",
                self.callstack.len()
            )));
        }

        let traces = flatten(&self.callstack[0]);
        debug!("Finalized {} call traces", traces.len());
        self.finalized = Some(traces.clone());
        Ok(traces)
    }
}

impl Tracer for CallParityTracer {
    fn hooks(&self) -> HookSet {
        HookSet::FRAMES
    }

    fn on_tx_start(
        &mut self,
        ctx: &VmContext,
        tx: &Transaction,
        from: Address,
        _state: &dyn StateReader,
    ) {
        if !self.accepting() {
            return;
        }
        if self.started {
            self.record_anomaly("transaction started twice".to_string());
            return;
        }

        self.started = true;
        self.precompiles = ctx.precompiles.iter().copied().collect();

        let kind = if tx.is_create() { FrameKind::Create } else { FrameKind::Call };
        self.callstack = vec![CallFrame::new(
            kind,
            from,
            tx.target(from),
            tx.input.clone(),
            tx.gas,
            tx.value,
        )];
        debug!("Call trace started: {:?} from {}", kind, from);
    }

    fn on_enter(&mut self, frame: &FrameEnter) {
        if !self.accepting() {
            return;
        }
        if !self.started || self.ended {
            self.record_anomaly(format!("enter at depth {} outside a transaction", frame.depth));
            return;
        }

        // Hosts that report the root frame refresh the synthetic one
        if frame.depth == 0 {
            if self.root_entered || self.callstack.len() != 1 {
                self.record_anomaly("root frame entered twice".to_string());
                return;
            }
            self.root_entered = true;
            let root = &mut self.callstack[0];
            root.from = frame.from;
            root.to = Some(frame.to);
            root.input = frame.input.clone();
            root.gas = frame.gas;
            root.value = frame.value;
            return;
        }

        if self.is_precompiled(&frame.to) && matches!(frame.op, OpCode::CALL | OpCode::STATICCALL) {
            self.skipped.push(frame.depth);
            return;
        }

        let Some(kind) = FrameKind::from_opcode(frame.op) else {
            self.record_anomaly(format!("frame entered by unexpected opcode {}", frame.op));
            self.skipped.push(frame.depth);
            return;
        };

        if frame.depth != self.callstack.len() {
            self.record_anomaly(format!(
                "enter at depth {} while {} frames are open",
                frame.depth,
                self.callstack.len()
            ));
        }
        if self.callstack.len() > MAX_CALL_DEPTH {
            self.record_anomaly(format!("call depth exceeds {}", MAX_CALL_DEPTH));
        }

        self.callstack.push(CallFrame::new(
            kind,
            frame.from,
            frame.to,
            frame.input.clone(),
            frame.gas,
            frame.value,
        ));
    }

    fn on_exit(&mut self, frame: &FrameExit) {
        if !self.accepting() {
            return;
        }
        if self.skipped.last() == Some(&frame.depth) {
            self.skipped.pop();
            return;
        }

        if frame.depth == 0 {
            if self.callstack.len() != 1 || self.root_closed {
                self.record_anomaly("root frame exited out of order".to_string());
                return;
            }
            self.root_closed = true;
            self.callstack[0].close(frame);
            return;
        }

        if self.callstack.len() <= 1 {
            self.record_anomaly(format!("exit at depth {} without matching enter", frame.depth));
            return;
        }
        if frame.depth != self.callstack.len() - 1 {
            self.record_anomaly(format!(
                "exit at depth {} but innermost open frame is at depth {}",
                frame.depth,
                self.callstack.len() - 1
            ));
        }

        if let Some(mut call) = self.callstack.pop() {
            call.close(frame);
            if let Some(parent) = self.callstack.last_mut() {
                parent.children.push(call);
            }
        }
    }

    fn on_tx_end(&mut self, receipt: Option<&Receipt>, error: Option<&str>, _state: &dyn StateReader) {
        if !self.accepting() {
            return;
        }
        if !self.started || self.ended {
            self.record_anomaly("txEnd without a matching txStart".to_string());
            return;
        }
        self.ended = true;

        if let (None, Some(err)) = (receipt, error) {
            debug!("Transaction rejected before execution: {}", err);
            self.rejected = Some(err.to_string());
            return;
        }

        let root_closed = self.root_closed;
        let Some(root) = self.callstack.first_mut() else {
            return;
        };
        if let Some(receipt) = receipt {
            root.gas_used = receipt.gas_used;
        }
        if !root_closed {
            if let Some(err) = error {
                root.fail(err);
            }
            self.root_closed = true;
        }
    }

    fn get_result(&mut self) -> Result<serde_json::Value, TraceError> {
        let traces = self.traces()?;
        Ok(serde_json::to_value(traces)?)
    }

    fn interrupt_handle(&self) -> Arc<Interrupt> {
        Arc::clone(&self.interrupt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn frame(kind: FrameKind, value: u64) -> CallFrame {
        CallFrame::new(
            kind,
            Address::ZERO,
            address!("00000000000000000000000000000000000000bb"),
            Bytes::from(vec![0x01]),
            100,
            U256::from(value),
        )
    }

    #[test]
    fn test_frame_kind_mapping() {
        assert_eq!(FrameKind::from_opcode(OpCode::CREATE2), Some(FrameKind::Create2));
        assert_eq!(FrameKind::from_opcode(OpCode::SELFDESTRUCT), Some(FrameKind::SelfDestruct));
        assert_eq!(FrameKind::from_opcode(OpCode::SSTORE), None);
    }

    #[test]
    fn test_delegatecall_inherits_parent_value() {
        let mut root = frame(FrameKind::Call, 7);
        let mut delegate = frame(FrameKind::DelegateCall, 0);
        delegate.children.push(frame(FrameKind::StaticCall, 0));
        root.children.push(delegate);
        root.children.push(frame(FrameKind::Call, 0));

        let traces = flatten(&root);

        let values: Vec<U256> = traces
            .iter()
            .map(|t| match &t.action {
                Action::Call(call) => call.value,
                other => panic!("unexpected action {:?}", other),
            })
            .collect();
        // plain CALL with zero value does not inherit
        assert_eq!(values, vec![U256::from(7), U256::from(7), U256::from(7), U256::ZERO]);
        let addresses: Vec<Vec<usize>> = traces.iter().map(|t| t.trace_address.clone()).collect();
        assert_eq!(addresses, vec![vec![], vec![0], vec![0, 0], vec![1]]);
    }

    #[test]
    fn test_failed_create_drops_address() {
        let mut create = frame(FrameKind::Create, 0);
        create.close(&FrameExit {
            depth: 1,
            error: Some("execution reverted".to_string()),
            reverted: true,
            ..Default::default()
        });

        let trace = create.to_parity(vec![0], U256::ZERO);
        assert_eq!(trace.error.as_deref(), Some("Reverted"));
        assert_eq!(trace.result, ResultSlot::Omitted);
        assert!(create.to.is_none());
    }

    #[test]
    fn test_get_result_without_transaction() {
        let mut tracer = CallParityTracer::new();
        assert!(matches!(tracer.get_result(), Err(TraceError::InvalidTrace(_))));
    }
}
