//! State-diff tracer.
//!
//! Delegates every hook to an embedded [`PrestateTracer`] and, at
//! finalization, turns its `pre`/`post` maps into Parity account deltas:
//! - `+` for accounts born in the transaction
//! - `-` for accounts that died
//! - `*` / `=` per field for accounts present on both sides

use super::prestate::PrestateTracer;
use crate::hooks::{
    FrameEnter, FrameExit, HookSet, Interrupt, OpcodeStep, Receipt, Tracer, Transaction,
    VmContext,
};
use crate::parity::{AccountDiff, Delta, Marker, StateDiff};
use crate::state::{AccountState, StateReader};
use crate::utils::error::TraceError;
use alloy_primitives::{Address, B256, U64};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct StateDiffTracer {
    prestate: PrestateTracer,
    finalized: Option<StateDiff>,
}

impl StateDiffTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The embedded prestate capture
    pub fn prestate(&self) -> &PrestateTracer {
        &self.prestate
    }

    /// Finalize into the typed diff
    ///
    /// **Public** - typed counterpart of `get_result`
    ///
    /// # Errors
    /// * `TraceError::Interrupted` - `stop` was called; `partial` holds the diff captured so far
    /// * `TraceError::StateAccess` - a state read failed during capture
    /// * `TraceError::InvalidTrace` - `txEnd` was never delivered
    pub fn state_diff(&mut self) -> Result<StateDiff, TraceError> {
        if let Some(diff) = &self.finalized {
            return Ok(diff.clone());
        }

        if let Some(reason) = self.prestate.interrupt().reason() {
            let partial = serde_json::to_value(partial_diff(&self.prestate))?;
            return Err(TraceError::Interrupted {
                reason,
                partial: Some(partial),
            });
        }
        if let Some(err) = self.prestate.state_error() {
            return Err(err.clone().into());
        }
        if !self.prestate.is_complete() {
            return Err(TraceError::invalid("transaction has not ended"));
        }

        let diff = build_diff(&self.prestate);
        debug!("State diff covers {} accounts", diff.len());
        self.finalized = Some(diff.clone());
        Ok(diff)
    }
}

fn build_diff(prestate: &PrestateTracer) -> StateDiff {
    let pre = prestate.pre();
    let post = prestate.post();
    let created = prestate.created();
    let addresses: BTreeSet<&Address> = pre.keys().chain(post.keys()).collect();

    let mut diff = BTreeMap::new();
    for address in addresses {
        let before = pre.get(address);
        let after = post.get(address);
        let marker = match (before, after) {
            (None, Some(_)) => Marker::Born,
            (Some(_), None) => Marker::Died,
            (Some(_), Some(_)) => Marker::Changed,
            (None, None) => continue,
        };

        let was_created = created.contains(address);
        if after.is_some_and(AccountState::is_empty) && !was_created {
            continue;
        }
        if was_created && prestate.destructed().contains(address) {
            continue;
        }
        if marker == Marker::Born && prestate.faults().contains_key(address) {
            debug!("Dropping born account {} after a fault", address);
            continue;
        }

        let account = account_diff(marker, before, after);
        if marker == Marker::Changed && account.is_unchanged() {
            continue;
        }
        diff.insert(*address, account);
    }

    StateDiff(diff)
}

/// Diff of whatever was captured before an interruption
///
/// Once the post snapshot exists this is the regular diff. Before it, every
/// account captured so far is reported with `=` fields since nothing is known
/// about its final state yet.
fn partial_diff(prestate: &PrestateTracer) -> StateDiff {
    if prestate.is_complete() {
        return build_diff(prestate);
    }
    let touched = prestate
        .pre()
        .keys()
        .map(|address| (*address, AccountDiff::default()))
        .collect();
    StateDiff(touched)
}

fn account_diff(
    marker: Marker,
    before: Option<&AccountState>,
    after: Option<&AccountState>,
) -> AccountDiff {
    let empty = AccountState::default();
    let before = before.unwrap_or(&empty);
    let after = after.unwrap_or(&empty);

    match marker {
        Marker::Born => AccountDiff {
            balance: Delta::Born(after.balance),
            nonce: Delta::Born(U64::from(after.nonce)),
            code: Delta::Born(after.code.clone()),
            storage: storage_diff(&empty.storage, &after.storage),
        },
        Marker::Died => AccountDiff {
            balance: Delta::Died(before.balance),
            nonce: Delta::Died(U64::from(before.nonce)),
            code: Delta::Died(before.code.clone()),
            storage: storage_diff(&before.storage, &empty.storage),
        },
        Marker::Changed => AccountDiff {
            balance: Delta::compare(before.balance, after.balance),
            nonce: Delta::compare(U64::from(before.nonce), U64::from(after.nonce)),
            code: Delta::compare(before.code.clone(), after.code.clone()),
            storage: storage_diff(&before.storage, &after.storage),
        },
    }
}

/// Zero-valued slots count as absent on either side
fn storage_diff(
    before: &BTreeMap<B256, B256>,
    after: &BTreeMap<B256, B256>,
) -> BTreeMap<B256, Delta<B256>> {
    let slots: BTreeSet<&B256> = before.keys().chain(after.keys()).collect();

    slots
        .into_iter()
        .filter_map(|slot| {
            let from = before.get(slot).copied().unwrap_or_default();
            let to = after.get(slot).copied().unwrap_or_default();
            let delta = match (from.is_zero(), to.is_zero()) {
                (true, true) => return None,
                _ if from == to => return None,
                (true, false) => Delta::Born(to),
                (false, true) => Delta::Died(from),
                (false, false) => Delta::compare(from, to),
            };
            Some((*slot, delta))
        })
        .collect()
}

impl Tracer for StateDiffTracer {
    fn hooks(&self) -> HookSet {
        self.prestate.hooks()
    }

    fn on_tx_start(
        &mut self,
        ctx: &VmContext,
        tx: &Transaction,
        from: Address,
        state: &dyn StateReader,
    ) {
        self.prestate.on_tx_start(ctx, tx, from, state);
    }

    fn on_enter(&mut self, frame: &FrameEnter) {
        self.prestate.on_enter(frame);
    }

    fn on_opcode(&mut self, step: &OpcodeStep, state: &dyn StateReader) {
        self.prestate.on_opcode(step, state);
    }

    fn on_fault(&mut self, step: &OpcodeStep, state: &dyn StateReader) {
        self.prestate.on_fault(step, state);
    }

    fn on_exit(&mut self, frame: &FrameExit) {
        self.prestate.on_exit(frame);
    }

    fn on_tx_end(&mut self, receipt: Option<&Receipt>, error: Option<&str>, state: &dyn StateReader) {
        self.prestate.on_tx_end(receipt, error, state);
    }

    fn get_result(&mut self) -> Result<serde_json::Value, TraceError> {
        let diff = self.state_diff()?;
        Ok(serde_json::to_value(diff)?)
    }

    fn interrupt_handle(&self) -> Arc<Interrupt> {
        self.prestate.interrupt_handle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_zero_transitions() {
        let (a, b, c, d) = (
            B256::with_last_byte(1),
            B256::with_last_byte(2),
            B256::with_last_byte(3),
            B256::with_last_byte(4),
        );
        let before = BTreeMap::from([(a, B256::ZERO), (b, B256::with_last_byte(5)), (c, B256::with_last_byte(6))]);
        let after = BTreeMap::from([(a, B256::ZERO), (b, B256::ZERO), (c, B256::with_last_byte(7)), (d, B256::with_last_byte(8))]);

        let diff = storage_diff(&before, &after);

        assert!(!diff.contains_key(&a));
        assert_eq!(diff[&b], Delta::Died(B256::with_last_byte(5)));
        assert_eq!(diff[&c], Delta::compare(B256::with_last_byte(6), B256::with_last_byte(7)));
        assert_eq!(diff[&d], Delta::Born(B256::with_last_byte(8)));
    }

    #[test]
    fn test_unchanged_slot_skipped() {
        let slot = B256::with_last_byte(1);
        let values = BTreeMap::from([(slot, B256::with_last_byte(9))]);
        assert!(storage_diff(&values, &values).is_empty());
    }

    #[test]
    fn test_born_account_diff() {
        let after = AccountState {
            nonce: 1,
            code: alloy_primitives::Bytes::from(vec![0x60u8, 0x00]),
            ..Default::default()
        };
        let diff = account_diff(Marker::Born, None, Some(&after));
        assert_eq!(diff.nonce, Delta::Born(U64::from(1)));
        assert_eq!(diff.balance, Delta::Born(Default::default()));
    }
}
