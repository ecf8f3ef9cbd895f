//! Flat call-trace elements in the OpenEthereum `trace_*` shape.
//!
//! Absent fields are omitted from JSON rather than written as `null`, with
//! one historical exception: suicide and reward traces carry `"result": null`.

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Top-level `type` of a trace element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceType {
    Call,
    Create,
    Suicide,
    Reward,
}

/// `action.callType`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
}

/// `action.creationMethod`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreationMethod {
    Create,
    Create2,
}

/// `action.rewardType`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardType {
    Block,
    Uncle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallAction {
    pub call_type: CallType,
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub gas: U64,
    pub input: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAction {
    pub creation_method: CreationMethod,
    pub from: Address,
    pub value: U256,
    pub gas: U64,
    pub init: Bytes,
}

/// SELFDESTRUCT, under its historical Parity name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuicideAction {
    /// The destructed contract
    pub address: Address,
    pub refund_address: Address,
    pub balance: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardAction {
    pub author: Address,
    pub reward_type: RewardType,
    pub value: U256,
}

/// The `action` object; its variant is implied by the trace `type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Action {
    Call(CallAction),
    Create(CreateAction),
    Suicide(SuicideAction),
    Reward(RewardAction),
}

impl Action {
    pub fn trace_type(&self) -> TraceType {
        match self {
            Action::Call(_) => TraceType::Call,
            Action::Create(_) => TraceType::Create,
            Action::Suicide(_) => TraceType::Suicide,
            Action::Reward(_) => TraceType::Reward,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallOutput {
    pub gas_used: U64,
    pub output: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOutput {
    pub address: Address,
    pub code: Bytes,
    pub gas_used: U64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraceOutput {
    Create(CreateOutput),
    Call(CallOutput),
}

/// The `result` slot of a trace element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResultSlot {
    Output(TraceOutput),
    /// Serialized as `"result": null`
    Null,
    /// Key left out entirely (failed frames)
    #[default]
    Omitted,
}

impl ResultSlot {
    pub fn is_omitted(&self) -> bool {
        matches!(self, ResultSlot::Omitted)
    }

    pub fn output(&self) -> Option<&TraceOutput> {
        match self {
            ResultSlot::Output(out) => Some(out),
            _ => None,
        }
    }
}

impl Serialize for ResultSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResultSlot::Output(out) => out.serialize(serializer),
            ResultSlot::Null | ResultSlot::Omitted => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for ResultSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<TraceOutput>::deserialize(deserializer)? {
            Some(out) => ResultSlot::Output(out),
            None => ResultSlot::Null,
        })
    }
}

/// One element of the flattened trace list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParityTrace {
    pub action: Action,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<B256>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "ResultSlot::is_omitted")]
    pub result: ResultSlot,

    pub subtraces: usize,

    pub trace_address: Vec<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_position: Option<u64>,

    #[serde(rename = "type")]
    pub trace_type: TraceType,
}

impl ParityTrace {
    /// A trace element with no block/transaction location
    pub fn new(action: Action, result: ResultSlot, error: Option<String>) -> Self {
        let trace_type = action.trace_type();
        Self {
            action,
            block_hash: None,
            block_number: None,
            error,
            result,
            subtraces: 0,
            trace_address: Vec::new(),
            transaction_hash: None,
            transaction_position: None,
            trace_type,
        }
    }

    /// Attach block and transaction coordinates (`trace_block` style)
    pub fn localize(
        &mut self,
        block_hash: B256,
        block_number: u64,
        transaction_hash: Option<B256>,
        transaction_position: Option<u64>,
    ) {
        self.block_hash = Some(block_hash);
        self.block_number = Some(block_number);
        self.transaction_hash = transaction_hash;
        self.transaction_position = transaction_position;
    }
}
