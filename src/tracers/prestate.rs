//! Prestate tracer: lazily records the original value of every account and
//! storage slot a transaction touches, then snapshots the same keys from the
//! final state.

use crate::hooks::{
    FrameEnter, HookSet, Interrupt, OpCode, OpcodeStep, Receipt, Tracer, Transaction, VmContext,
};
use crate::state::{AccountState, StateReader};
use crate::utils::error::{StateError, TraceError};
use alloy_primitives::{Address, B256};
use log::{debug, warn};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct PrestateTracer {
    /// Accounts that existed before the transaction, with the slots read so far
    pre: BTreeMap<Address, AccountState>,
    /// Touched accounts that exist after the transaction
    post: BTreeMap<Address, AccountState>,
    touched: BTreeSet<Address>,
    /// Learned from frame events; resolved at the next state-bearing hook
    pending: BTreeSet<Address>,
    /// First-seen value of every touched slot, per account
    slots: BTreeMap<Address, BTreeMap<B256, B256>>,
    written: BTreeSet<(Address, B256)>,
    created: BTreeSet<Address>,
    destructed: BTreeSet<Address>,
    faults: BTreeMap<Address, String>,
    state_error: Option<StateError>,
    started: bool,
    ended: bool,
    interrupt: Arc<Interrupt>,
}

impl PrestateTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pre(&self) -> &BTreeMap<Address, AccountState> {
        &self.pre
    }

    pub fn post(&self) -> &BTreeMap<Address, AccountState> {
        &self.post
    }

    /// Accounts deployed by this transaction
    pub fn created(&self) -> &BTreeSet<Address> {
        &self.created
    }

    pub fn destructed(&self) -> &BTreeSet<Address> {
        &self.destructed
    }

    /// Error text recorded against each account whose code faulted
    pub fn faults(&self) -> &BTreeMap<Address, String> {
        &self.faults
    }

    /// First state read failure, if any
    pub fn state_error(&self) -> Option<&StateError> {
        self.state_error.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.ended
    }

    pub(crate) fn interrupt(&self) -> &Arc<Interrupt> {
        &self.interrupt
    }

    fn accepting(&self) -> bool {
        !self.interrupt.is_raised() && !self.ended
    }

    fn record_state_error(&mut self, err: StateError) {
        warn!("State read failed: {}", err);
        if self.state_error.is_none() {
            self.state_error = Some(err);
        }
    }

    fn record_fault(&mut self, contract: Address, error: &str) {
        debug!("Fault in {}: {}", contract, error);
        self.faults
            .entry(contract)
            .or_insert_with(|| error.to_string());
    }

    /// Capture an account's original fields on first access
    fn lookup_account(&mut self, address: Address, state: &dyn StateReader) {
        self.pending.remove(&address);
        if !self.touched.insert(address) {
            return;
        }

        let existing = state
            .exists(address)
            .and_then(|exists| exists.then(|| state.account(address)).transpose());
        match existing {
            Ok(Some(account)) => {
                self.pre.insert(address, account);
            }
            Ok(None) => {}
            Err(err) => self.record_state_error(err),
        }
    }

    /// Capture a slot's original value on first access
    fn lookup_storage(&mut self, address: Address, slot: B256, state: &dyn StateReader) {
        self.lookup_account(address, state);

        if self
            .slots
            .get(&address)
            .is_some_and(|known| known.contains_key(&slot))
        {
            return;
        }
        let value = match state.storage(address, slot) {
            Ok(value) => value,
            Err(err) => {
                self.record_state_error(err);
                return;
            }
        };
        self.slots.entry(address).or_default().insert(slot, value);
        if let Some(account) = self.pre.get_mut(&address) {
            account.storage.insert(slot, value);
        }
    }

    fn resolve_pending(&mut self, state: &dyn StateReader) {
        let pending = std::mem::take(&mut self.pending);
        for address in pending {
            self.lookup_account(address, state);
        }
    }

    fn touch_step(&mut self, step: &OpcodeStep, state: &dyn StateReader) {
        let scope = &step.scope;
        let contract = scope.contract;

        match step.op {
            OpCode::SLOAD | OpCode::SSTORE => {
                if let Some(slot) = scope.peek_word(0) {
                    self.lookup_storage(contract, slot, state);
                    if step.op == OpCode::SSTORE {
                        self.written.insert((contract, slot));
                    }
                }
            }
            OpCode::EXTCODECOPY | OpCode::EXTCODEHASH | OpCode::EXTCODESIZE | OpCode::BALANCE => {
                if let Some(address) = scope.peek_address(0) {
                    self.lookup_account(address, state);
                }
            }
            OpCode::CALL | OpCode::CALLCODE | OpCode::DELEGATECALL | OpCode::STATICCALL => {
                if scope.stack.len() >= 5 {
                    if let Some(address) = scope.peek_address(1) {
                        self.lookup_account(address, state);
                    }
                }
            }
            OpCode::CREATE => match state.nonce(contract) {
                Ok(nonce) => {
                    let address = contract.create(nonce);
                    self.lookup_account(address, state);
                    self.created.insert(address);
                }
                Err(err) => self.record_state_error(err),
            },
            OpCode::CREATE2 => {
                let (Some(offset), Some(size), Some(salt)) =
                    (scope.peek(1), scope.peek(2), scope.peek_word(3))
                else {
                    return;
                };
                match scope.memory_slice(offset, size) {
                    Some(init) => {
                        let address = contract.create2_from_code(salt, init);
                        self.lookup_account(address, state);
                        self.created.insert(address);
                    }
                    None => warn!("CREATE2 init code outside memory at pc {}", step.pc),
                }
            }
            OpCode::SELFDESTRUCT => {
                if let Some(beneficiary) = scope.peek_address(0) {
                    self.lookup_account(beneficiary, state);
                }
                self.lookup_account(contract, state);
                self.destructed.insert(contract);
            }
            _ => {}
        }
    }

    /// Re-read every touched account from the final state
    fn snapshot_post(&mut self, state: &dyn StateReader) {
        let touched: Vec<Address> = self.touched.iter().copied().collect();
        for address in touched {
            if self.destructed.contains(&address) {
                continue;
            }
            match state.exists(address) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(err) => {
                    self.record_state_error(err);
                    continue;
                }
            }

            let mut account = match state.account(address) {
                Ok(account) => account,
                Err(err) => {
                    self.record_state_error(err);
                    continue;
                }
            };

            let known = self.slots.get(&address).cloned().unwrap_or_default();
            for (slot, initial) in known {
                let value = if self.written.contains(&(address, slot)) {
                    match state.storage(address, slot) {
                        Ok(value) => value,
                        Err(err) => {
                            self.record_state_error(err);
                            continue;
                        }
                    }
                } else {
                    initial
                };
                account.storage.insert(slot, value);
            }
            self.post.insert(address, account);
        }
    }
}

impl Tracer for PrestateTracer {
    fn hooks(&self) -> HookSet {
        HookSet::ALL
    }

    fn on_tx_start(
        &mut self,
        ctx: &VmContext,
        tx: &Transaction,
        from: Address,
        state: &dyn StateReader,
    ) {
        if !self.accepting() || self.started {
            return;
        }
        self.started = true;

        let target = tx.target(from);
        self.lookup_account(from, state);
        self.lookup_account(target, state);
        self.lookup_account(ctx.coinbase, state);
        if tx.is_create() {
            self.created.insert(target);
        }
    }

    fn on_enter(&mut self, frame: &FrameEnter) {
        if !self.accepting() {
            return;
        }
        if frame.op.is_create() {
            self.created.insert(frame.to);
        }
        if !self.touched.contains(&frame.to) {
            self.pending.insert(frame.to);
        }
    }

    fn on_opcode(&mut self, step: &OpcodeStep, state: &dyn StateReader) {
        if !self.accepting() {
            return;
        }
        self.resolve_pending(state);

        // A failing step did not execute
        if let Some(err) = &step.error {
            self.record_fault(step.scope.contract, err);
            return;
        }
        self.touch_step(step, state);
    }

    fn on_fault(&mut self, step: &OpcodeStep, _state: &dyn StateReader) {
        if !self.accepting() {
            return;
        }
        let error = step.error.as_deref().unwrap_or("fault");
        self.record_fault(step.scope.contract, error);
    }

    fn on_tx_end(&mut self, _receipt: Option<&Receipt>, _error: Option<&str>, state: &dyn StateReader) {
        if !self.accepting() {
            return;
        }
        if !self.started {
            warn!("txEnd received before txStart");
            return;
        }

        // Frames never followed by a state-bearing hook did not exist before
        let pending = std::mem::take(&mut self.pending);
        self.touched.extend(pending);

        self.snapshot_post(state);
        self.ended = true;
        debug!(
            "Prestate captured: {} pre accounts, {} post accounts",
            self.pre.len(),
            self.post.len()
        );
    }

    fn get_result(&mut self) -> Result<serde_json::Value, TraceError> {
        if let Some(reason) = self.interrupt.reason() {
            let partial = Some(json!({ "pre": &self.pre }));
            return Err(TraceError::Interrupted { reason, partial });
        }
        if let Some(err) = &self.state_error {
            return Err(err.clone().into());
        }
        if !self.ended {
            return Err(TraceError::invalid("transaction has not ended"));
        }
        Ok(json!({ "pre": &self.pre, "post": &self.post }))
    }

    fn interrupt_handle(&self) -> Arc<Interrupt> {
        Arc::clone(&self.interrupt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::ScopeContext;
    use crate::state::InMemoryState;
    use alloy_primitives::{address, U256};

    const CONTRACT: Address = address!("00000000000000000000000000000000000000cc");

    fn step(op: OpCode, stack: Vec<U256>) -> OpcodeStep {
        OpcodeStep {
            pc: 0,
            op,
            gas: 0,
            cost: 0,
            scope: ScopeContext {
                stack,
                memory: Default::default(),
                contract: CONTRACT,
            },
            return_data: Default::default(),
            depth: 1,
            error: None,
        }
    }

    #[test]
    fn test_slot_read_keeps_pre_value() {
        let slot = B256::with_last_byte(1);
        let mut account = AccountState {
            nonce: 1,
            ..Default::default()
        };
        account.storage.insert(slot, B256::with_last_byte(9));
        let pre = InMemoryState::new().with_account(CONTRACT, account.clone());

        // The final state disagrees, but the slot was only read
        let mut changed = account;
        changed.storage.insert(slot, B256::with_last_byte(7));
        let post = InMemoryState::new().with_account(CONTRACT, changed);

        let mut tracer = PrestateTracer::new();
        let tx = Transaction {
            to: Some(CONTRACT),
            ..Default::default()
        };
        tracer.on_tx_start(&VmContext::default(), &tx, Address::ZERO, &pre);
        tracer.on_opcode(&step(OpCode::SLOAD, vec![U256::from(1)]), &pre);
        tracer.on_tx_end(None, None, &post);

        assert_eq!(tracer.pre()[&CONTRACT].storage[&slot], B256::with_last_byte(9));
        assert_eq!(tracer.post()[&CONTRACT].storage[&slot], B256::with_last_byte(9));
    }

    #[test]
    fn test_failed_step_records_fault_only() {
        let state = InMemoryState::new();
        let mut tracer = PrestateTracer::new();
        tracer.on_tx_start(&VmContext::default(), &Transaction::default(), Address::ZERO, &state);

        let mut failing = step(OpCode::SSTORE, vec![]);
        failing.error = Some("stack underflow (0 <=> 2)".to_string());
        tracer.on_opcode(&failing, &state);

        assert_eq!(
            tracer.faults().get(&CONTRACT).map(String::as_str),
            Some("stack underflow (0 <=> 2)")
        );
        assert!(!tracer.slots.contains_key(&CONTRACT));
    }

    #[test]
    fn test_result_requires_tx_end() {
        let mut tracer = PrestateTracer::new();
        assert!(matches!(tracer.get_result(), Err(TraceError::InvalidTrace(_))));
    }
}
