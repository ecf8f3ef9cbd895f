//! Hook payloads and the serializable event stream.

use super::context::{Receipt, Transaction, VmContext};
use super::opcode::OpCode;
use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// Payload of `on_enter`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameEnter {
    /// Depth of the frame being entered (the transaction's root frame is 0)
    pub depth: usize,

    /// Opcode that opened the frame
    pub op: OpCode,

    pub from: Address,

    /// Callee, created contract, or SELFDESTRUCT beneficiary
    pub to: Address,

    #[serde(default)]
    pub input: Bytes,

    #[serde(default)]
    pub gas: u64,

    #[serde(default)]
    pub value: U256,
}

/// Payload of `on_exit`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameExit {
    pub depth: usize,

    #[serde(default)]
    pub output: Bytes,

    #[serde(default)]
    pub gas_used: u64,

    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub reverted: bool,
}

impl FrameExit {
    /// Error text for this exit; a bare revert flag reads as `execution reverted`
    pub fn error_message(&self) -> Option<&str> {
        match (&self.error, self.reverted) {
            (Some(err), _) => Some(err.as_str()),
            (None, true) => Some("execution reverted"),
            (None, false) => None,
        }
    }
}

/// Stack, memory and executing contract at an opcode step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeContext {
    /// Bottom first; the top of the stack is the last element
    #[serde(default)]
    pub stack: Vec<U256>,

    #[serde(default)]
    pub memory: Bytes,

    pub contract: Address,
}

impl ScopeContext {
    /// Item `n` positions below the top (0 is the top)
    pub fn peek(&self, n: usize) -> Option<U256> {
        let len = self.stack.len();
        if n < len {
            Some(self.stack[len - 1 - n])
        } else {
            None
        }
    }

    pub fn peek_word(&self, n: usize) -> Option<B256> {
        self.peek(n).map(|v| B256::from(v.to_be_bytes::<32>()))
    }

    /// Low 20 bytes of the stack item, as the EVM reads addresses
    pub fn peek_address(&self, n: usize) -> Option<Address> {
        self.peek_word(n).map(|w| Address::from_slice(&w[12..]))
    }

    /// Memory range, or `None` when it lies outside the current memory
    pub fn memory_slice(&self, offset: U256, size: U256) -> Option<&[u8]> {
        let offset = usize::try_from(u64::try_from(offset).ok()?).ok()?;
        let size = usize::try_from(u64::try_from(size).ok()?).ok()?;
        let end = offset.checked_add(size)?;
        self.memory.get(offset..end)
    }
}

/// Payload of `on_opcode` and `on_fault`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpcodeStep {
    #[serde(default)]
    pub pc: u64,

    pub op: OpCode,

    #[serde(default)]
    pub gas: u64,

    #[serde(default)]
    pub cost: u64,

    pub scope: ScopeContext,

    #[serde(default)]
    pub return_data: Bytes,

    #[serde(default)]
    pub depth: usize,

    #[serde(default)]
    pub error: Option<String>,
}

/// One recorded hook invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum HookEvent {
    TxStart {
        #[serde(default)]
        context: VmContext,
        tx: Transaction,
        from: Address,
    },
    Enter(FrameEnter),
    Opcode(OpcodeStep),
    Fault(OpcodeStep),
    Exit(FrameExit),
    TxEnd {
        #[serde(default)]
        receipt: Option<Receipt>,
        #[serde(default)]
        error: Option<String>,
    },
}

impl HookEvent {
    /// Event name as used in the `event` tag
    pub fn name(&self) -> &'static str {
        match self {
            HookEvent::TxStart { .. } => "txStart",
            HookEvent::Enter(_) => "enter",
            HookEvent::Opcode(_) => "opcode",
            HookEvent::Fault(_) => "fault",
            HookEvent::Exit(_) => "exit",
            HookEvent::TxEnd { .. } => "txEnd",
        }
    }
}
