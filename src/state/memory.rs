//! BTreeMap-backed state view.
//!
//! Used by the replay command (one view for the pre-state, one for the
//! post-state) and by tests.

use super::{AccountState, StateReader};
use crate::utils::error::StateError;
use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An allocation of accounts, keyed by address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemoryState {
    accounts: BTreeMap<Address, AccountState>,
}

impl InMemoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy in tests
    pub fn with_account(mut self, address: Address, account: AccountState) -> Self {
        self.accounts.insert(address, account);
        self
    }

    pub fn insert(&mut self, address: Address, account: AccountState) {
        self.accounts.insert(address, account);
    }

    pub fn remove(&mut self, address: Address) -> Option<AccountState> {
        self.accounts.remove(&address)
    }

    pub fn get(&self, address: Address) -> Option<&AccountState> {
        self.accounts.get(&address)
    }

    pub fn get_mut(&mut self, address: Address) -> Option<&mut AccountState> {
        self.accounts.get_mut(&address)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl From<BTreeMap<Address, AccountState>> for InMemoryState {
    fn from(accounts: BTreeMap<Address, AccountState>) -> Self {
        Self { accounts }
    }
}

impl StateReader for InMemoryState {
    fn balance(&self, address: Address) -> Result<U256, StateError> {
        Ok(self.get(address).map(|a| a.balance).unwrap_or_default())
    }

    fn nonce(&self, address: Address) -> Result<u64, StateError> {
        Ok(self.get(address).map(|a| a.nonce).unwrap_or_default())
    }

    fn code(&self, address: Address) -> Result<Bytes, StateError> {
        Ok(self.get(address).map(|a| a.code.clone()).unwrap_or_default())
    }

    fn storage(&self, address: Address, slot: B256) -> Result<B256, StateError> {
        Ok(self
            .get(address)
            .and_then(|a| a.storage.get(&slot).copied())
            .unwrap_or_default())
    }

    fn exists(&self, address: Address) -> Result<bool, StateError> {
        Ok(self.accounts.contains_key(&address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_missing_account_reads_as_empty() {
        let state = InMemoryState::new();
        let addr = address!("00000000000000000000000000000000000000aa");

        assert!(!state.exists(addr).unwrap());
        assert!(StateReader::is_empty(&state, addr).unwrap());
        assert_eq!(state.storage(addr, B256::with_last_byte(1)).unwrap(), B256::ZERO);
    }

    #[test]
    fn test_account_lookup() {
        let addr = address!("00000000000000000000000000000000000000bb");
        let mut account = AccountState {
            balance: U256::from(7),
            nonce: 3,
            ..Default::default()
        };
        account.storage.insert(B256::with_last_byte(1), B256::with_last_byte(0xff));
        let state = InMemoryState::new().with_account(addr, account);

        assert!(state.exists(addr).unwrap());
        assert!(!StateReader::is_empty(&state, addr).unwrap());
        assert_eq!(state.balance(addr).unwrap(), U256::from(7));
        assert_eq!(state.nonce(addr).unwrap(), 3);
        assert_eq!(
            state.storage(addr, B256::with_last_byte(1)).unwrap(),
            B256::with_last_byte(0xff)
        );
    }

    #[test]
    fn test_deserialize_allocation() {
        let json = r#"{
            "0x00000000000000000000000000000000000000cc": {
                "balance": "0x10",
                "nonce": 1,
                "code": "0x6000",
                "storage": {
                    "0x0000000000000000000000000000000000000000000000000000000000000001": "0x00000000000000000000000000000000000000000000000000000000000000ff"
                }
            }
        }"#;
        let state: InMemoryState = serde_json::from_str(json).unwrap();
        let addr = address!("00000000000000000000000000000000000000cc");

        assert_eq!(state.len(), 1);
        assert_eq!(state.balance(addr).unwrap(), U256::from(16));
        assert_eq!(state.code(addr).unwrap().len(), 2);
    }
}
