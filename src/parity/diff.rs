//! State-diff output: per-account deltas tagged with the `+ - * =` markers.

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `{from, to}` pair carried by the `*` marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedType<T> {
    pub from: T,
    pub to: T,
}

/// A single field's delta
///
/// `Unchanged` serializes as the bare string `"="`; the other variants as a
/// single-key map keyed by their marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delta<T> {
    #[default]
    #[serde(rename = "=")]
    Unchanged,
    #[serde(rename = "+")]
    Born(T),
    #[serde(rename = "-")]
    Died(T),
    #[serde(rename = "*")]
    Changed(ChangedType<T>),
}

impl<T: PartialEq> Delta<T> {
    /// `=` when equal, `*` otherwise
    pub fn compare(from: T, to: T) -> Self {
        if from == to {
            Delta::Unchanged
        } else {
            Delta::Changed(ChangedType { from, to })
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, Delta::Unchanged)
    }
}

/// How an account relates to the transaction as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Born,
    Died,
    Changed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDiff {
    pub balance: Delta<U256>,
    pub nonce: Delta<U64>,
    pub code: Delta<Bytes>,
    pub storage: BTreeMap<B256, Delta<B256>>,
}

impl AccountDiff {
    /// Every field `=` and no storage entries
    pub fn is_unchanged(&self) -> bool {
        self.balance.is_unchanged()
            && self.nonce.is_unchanged()
            && self.code.is_unchanged()
            && self.storage.is_empty()
    }
}

/// Address-keyed diffs; BTreeMap keeps the output in canonical order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateDiff(pub BTreeMap<Address, AccountDiff>);

impl StateDiff {
    pub fn get(&self, address: &Address) -> Option<&AccountDiff> {
        self.0.get(address)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
