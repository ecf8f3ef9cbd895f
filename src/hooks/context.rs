//! Ambient VM context and transaction payloads delivered with `on_tx_start`
//! and `on_tx_end`.

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// Block and transaction environment, immutable for the trace duration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmContext {
    #[serde(default)]
    pub block_number: u64,

    #[serde(default)]
    pub block_hash: B256,

    #[serde(default)]
    pub time: u64,

    #[serde(default)]
    pub coinbase: Address,

    #[serde(default)]
    pub base_fee: Option<U256>,

    #[serde(default)]
    pub origin: Address,

    #[serde(default)]
    pub gas_price: U256,

    #[serde(default)]
    pub tx_hash: Option<B256>,

    #[serde(default)]
    pub tx_index: Option<u64>,

    /// Precompiles active under the block's rules
    #[serde(default)]
    pub precompiles: Vec<Address>,
}

/// The signed transaction being traced (only the fields tracers read)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default)]
    pub hash: Option<B256>,

    #[serde(default)]
    pub nonce: u64,

    /// `None` for contract creation
    #[serde(default)]
    pub to: Option<Address>,

    #[serde(default)]
    pub value: U256,

    #[serde(default)]
    pub gas: u64,

    #[serde(default)]
    pub gas_price: U256,

    #[serde(default)]
    pub input: Bytes,
}

impl Transaction {
    pub fn is_create(&self) -> bool {
        self.to.is_none()
    }

    /// Recipient, or the address the creation will deploy to
    pub fn target(&self, sender: Address) -> Address {
        self.to.unwrap_or_else(|| sender.create(self.nonce))
    }
}

/// Receipt fields available at `on_tx_end`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub gas_used: u64,

    #[serde(default)]
    pub contract_address: Option<Address>,
}
