//! Push recorded hook events into a tracer.

use super::events::HookEvent;
use super::Tracer;
use crate::state::StateReader;
use crate::utils::error::TraceError;
use log::debug;

/// Deliver one event, honouring the tracer's [`super::HookSet`]
///
/// **Public** - building block for hosts that record events
pub fn dispatch(tracer: &mut dyn Tracer, event: &HookEvent, state: &dyn StateReader) {
    let hooks = tracer.hooks();

    match event {
        HookEvent::TxStart { context, tx, from } if hooks.tx => {
            tracer.on_tx_start(context, tx, *from, state)
        }
        HookEvent::Enter(frame) if hooks.frames => tracer.on_enter(frame),
        HookEvent::Opcode(step) if hooks.opcodes => tracer.on_opcode(step, state),
        HookEvent::Fault(step) if hooks.faults => tracer.on_fault(step, state),
        HookEvent::Exit(frame) if hooks.frames => tracer.on_exit(frame),
        HookEvent::TxEnd { receipt, error } if hooks.tx => {
            tracer.on_tx_end(receipt.as_ref(), error.as_deref(), state)
        }
        _ => {}
    }
}

/// Replay a whole transaction's events into a tracer
///
/// **Public** - main entry point used by the `replay` command
///
/// # Arguments
/// * `tracer` - Fresh tracer instance
/// * `events` - Recorded events, `txStart` first
/// * `pre` - State view before the transaction (handed to every hook but `txEnd`)
/// * `post` - State view after the transaction (handed to `txEnd`)
///
/// # Errors
/// * `TraceError::InvalidTrace` - The stream does not start with `txStart`
///   or does not end with `txEnd`
pub fn replay(
    tracer: &mut dyn Tracer,
    events: &[HookEvent],
    pre: &dyn StateReader,
    post: &dyn StateReader,
) -> Result<usize, TraceError> {
    match events.first() {
        Some(HookEvent::TxStart { .. }) => {}
        Some(other) => {
            return Err(TraceError::invalid(format!(
                "event stream starts with {} instead of txStart",
                other.name()
            )))
        }
        None => return Err(TraceError::invalid("event stream is empty")),
    }
    if !matches!(events.last(), Some(HookEvent::TxEnd { .. })) {
        return Err(TraceError::invalid("event stream does not end with txEnd"));
    }

    debug!("Replaying {} hook events", events.len());

    for event in events {
        let state = match event {
            HookEvent::TxEnd { .. } => post,
            _ => pre,
        };
        dispatch(tracer, event, state);
    }

    Ok(events.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{FrameEnter, FrameExit, HookSet, Interrupt, OpCode, OpcodeStep, Transaction};
    use crate::state::InMemoryState;
    use alloy_primitives::Address;
    use std::sync::Arc;

    /// Records the names of the hooks it receives
    #[derive(Default)]
    struct Recorder {
        seen: Vec<&'static str>,
        hooks: Option<HookSet>,
        interrupt: Arc<Interrupt>,
    }

    impl Tracer for Recorder {
        fn hooks(&self) -> HookSet {
            self.hooks.unwrap_or(HookSet::ALL)
        }

        fn on_tx_start(
            &mut self,
            _ctx: &crate::hooks::VmContext,
            _tx: &Transaction,
            _from: Address,
            _state: &dyn StateReader,
        ) {
            self.seen.push("txStart");
        }

        fn on_enter(&mut self, _frame: &FrameEnter) {
            self.seen.push("enter");
        }

        fn on_opcode(&mut self, _step: &OpcodeStep, _state: &dyn StateReader) {
            self.seen.push("opcode");
        }

        fn on_exit(&mut self, _frame: &FrameExit) {
            self.seen.push("exit");
        }

        fn on_tx_end(
            &mut self,
            _receipt: Option<&crate::hooks::Receipt>,
            _error: Option<&str>,
            _state: &dyn StateReader,
        ) {
            self.seen.push("txEnd");
        }

        fn get_result(&mut self) -> Result<serde_json::Value, TraceError> {
            Ok(serde_json::json!(self.seen))
        }

        fn interrupt_handle(&self) -> Arc<Interrupt> {
            Arc::clone(&self.interrupt)
        }
    }

    fn sample_events() -> Vec<HookEvent> {
        vec![
            HookEvent::TxStart {
                context: Default::default(),
                tx: Transaction::default(),
                from: Address::ZERO,
            },
            HookEvent::Enter(FrameEnter {
                depth: 1,
                op: OpCode::CALL,
                from: Address::ZERO,
                to: Address::ZERO,
                input: Default::default(),
                gas: 0,
                value: Default::default(),
            }),
            HookEvent::Opcode(OpcodeStep {
                pc: 0,
                op: OpCode::STOP,
                gas: 0,
                cost: 0,
                scope: Default::default(),
                return_data: Default::default(),
                depth: 1,
                error: None,
            }),
            HookEvent::Exit(FrameExit {
                depth: 1,
                ..Default::default()
            }),
            HookEvent::TxEnd {
                receipt: None,
                error: None,
            },
        ]
    }

    #[test]
    fn test_replay_dispatches_in_order() {
        let state = InMemoryState::new();
        let mut recorder = Recorder::default();

        let count = replay(&mut recorder, &sample_events(), &state, &state).unwrap();

        assert_eq!(count, 5);
        assert_eq!(recorder.seen, vec!["txStart", "enter", "opcode", "exit", "txEnd"]);
    }

    #[test]
    fn test_replay_skips_hooks_not_requested() {
        let state = InMemoryState::new();
        let mut recorder = Recorder {
            hooks: Some(HookSet::FRAMES),
            ..Default::default()
        };

        replay(&mut recorder, &sample_events(), &state, &state).unwrap();

        assert_eq!(recorder.seen, vec!["txStart", "enter", "exit", "txEnd"]);
    }

    #[test]
    fn test_replay_rejects_stream_without_tx_start() {
        let state = InMemoryState::new();
        let mut recorder = Recorder::default();
        let events = sample_events()[1..].to_vec();

        let err = replay(&mut recorder, &events, &state, &state).unwrap_err();
        assert!(matches!(err, TraceError::InvalidTrace(_)));
        assert!(recorder.seen.is_empty());
    }
}
