#![allow(dead_code)]

use alloy_primitives::{address, Address, Bytes, U256};
use parity_trace::hooks::{
    FrameEnter, FrameExit, HookEvent, OpCode, OpcodeStep, Receipt, ScopeContext, Transaction,
    VmContext,
};
use parity_trace::state::AccountState;

pub const SENDER: Address = address!("00000000000000000000000000000000000000a0");
pub const RECIPIENT: Address = address!("00000000000000000000000000000000000000b0");
pub const CONTRACT_A: Address = address!("00000000000000000000000000000000000000a1");
pub const CONTRACT_C: Address = address!("00000000000000000000000000000000000000c1");
pub const CONTRACT_D: Address = address!("00000000000000000000000000000000000000d1");
pub const ECRECOVER: Address = address!("0000000000000000000000000000000000000001");

pub fn context() -> VmContext {
    VmContext {
        block_number: 100,
        precompiles: vec![ECRECOVER],
        ..Default::default()
    }
}

pub fn tx_start(to: Option<Address>, value: u64, gas: u64) -> HookEvent {
    HookEvent::TxStart {
        context: context(),
        tx: Transaction {
            to,
            value: U256::from(value),
            gas,
            ..Default::default()
        },
        from: SENDER,
    }
}

pub fn enter(depth: usize, op: OpCode, from: Address, to: Address, value: u64) -> HookEvent {
    enter_with_input(depth, op, from, to, value, Bytes::new())
}

pub fn enter_with_input(
    depth: usize,
    op: OpCode,
    from: Address,
    to: Address,
    value: u64,
    input: Bytes,
) -> HookEvent {
    HookEvent::Enter(FrameEnter {
        depth,
        op,
        from,
        to,
        input,
        gas: 50_000,
        value: U256::from(value),
    })
}

pub fn exit_ok(depth: usize, gas_used: u64, output: Bytes) -> HookEvent {
    HookEvent::Exit(FrameExit {
        depth,
        output,
        gas_used,
        error: None,
        reverted: false,
    })
}

pub fn exit_err(depth: usize, error: &str) -> HookEvent {
    HookEvent::Exit(FrameExit {
        depth,
        output: Bytes::new(),
        gas_used: 50_000,
        error: Some(error.to_string()),
        reverted: false,
    })
}

pub fn exit_reverted(depth: usize) -> HookEvent {
    HookEvent::Exit(FrameExit {
        depth,
        gas_used: 1_000,
        reverted: true,
        ..Default::default()
    })
}

pub fn opcode(op: OpCode, contract: Address, depth: usize, stack: Vec<U256>) -> HookEvent {
    HookEvent::Opcode(step(op, contract, depth, stack))
}

pub fn step(op: OpCode, contract: Address, depth: usize, stack: Vec<U256>) -> OpcodeStep {
    OpcodeStep {
        pc: 0,
        op,
        gas: 50_000,
        cost: 3,
        scope: ScopeContext {
            stack,
            memory: Bytes::new(),
            contract,
        },
        return_data: Bytes::new(),
        depth,
        error: None,
    }
}

pub fn tx_end(gas_used: u64) -> HookEvent {
    HookEvent::TxEnd {
        receipt: Some(Receipt {
            gas_used,
            contract_address: None,
        }),
        error: None,
    }
}

pub fn account(balance: u64, nonce: u64) -> AccountState {
    AccountState {
        balance: U256::from(balance),
        nonce,
        ..Default::default()
    }
}

pub fn contract_account(code: &[u8]) -> AccountState {
    AccountState {
        nonce: 1,
        code: Bytes::copy_from_slice(code),
        ..Default::default()
    }
}

/// Stack word holding an address
pub fn word(address: Address) -> U256 {
    U256::from_be_slice(address.as_slice())
}

/// JSON object key for an address, as the state diff writes it
pub fn key(address: Address) -> String {
    serde_json::to_value(address)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}
