//! Host state view consumed by the tracers.
//!
//! The host VM owns the state database; tracers only read from it through
//! [`StateReader`]. The host must keep the view consistent for the duration
//! of a trace (snapshot semantics).

pub mod memory;

pub use memory::InMemoryState;

use crate::utils::error::StateError;
use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read-only access to account and storage data
pub trait StateReader {
    fn balance(&self, address: Address) -> Result<U256, StateError>;

    fn nonce(&self, address: Address) -> Result<u64, StateError>;

    fn code(&self, address: Address) -> Result<Bytes, StateError>;

    /// Storage word at `slot`; unset slots read as the zero hash
    fn storage(&self, address: Address, slot: B256) -> Result<B256, StateError>;

    fn exists(&self, address: Address) -> Result<bool, StateError>;

    /// EIP-161 emptiness: zero balance, zero nonce, no code
    fn is_empty(&self, address: Address) -> Result<bool, StateError> {
        Ok(self.balance(address)?.is_zero()
            && self.nonce(address)? == 0
            && self.code(address)?.is_empty())
    }

    /// Load the account fields (without storage) in one go
    fn account(&self, address: Address) -> Result<AccountState, StateError> {
        Ok(AccountState {
            balance: self.balance(address)?,
            nonce: self.nonce(address)?,
            code: self.code(address)?,
            storage: BTreeMap::new(),
        })
    }
}

/// Balance, nonce, code and the storage slots known for one account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    #[serde(default)]
    pub balance: U256,

    #[serde(default)]
    pub nonce: u64,

    #[serde(default)]
    pub code: Bytes,

    #[serde(default)]
    pub storage: BTreeMap<B256, B256>,
}

impl AccountState {
    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.nonce == 0 && self.code.is_empty()
    }
}
