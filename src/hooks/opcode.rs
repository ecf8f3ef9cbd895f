//! EVM opcode identifiers as seen by the hooks.
//!
//! Only the mnemonics the tracers care about are named; any other byte is
//! carried through as-is and rendered as `0xNN`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single EVM opcode byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OpCode(pub u8);

impl OpCode {
    pub const STOP: OpCode = OpCode(0x00);
    pub const ADD: OpCode = OpCode(0x01);
    pub const BALANCE: OpCode = OpCode(0x31);
    pub const EXTCODESIZE: OpCode = OpCode(0x3b);
    pub const EXTCODECOPY: OpCode = OpCode(0x3c);
    pub const EXTCODEHASH: OpCode = OpCode(0x3f);
    pub const POP: OpCode = OpCode(0x50);
    pub const MLOAD: OpCode = OpCode(0x51);
    pub const MSTORE: OpCode = OpCode(0x52);
    pub const SLOAD: OpCode = OpCode(0x54);
    pub const SSTORE: OpCode = OpCode(0x55);
    pub const JUMP: OpCode = OpCode(0x56);
    pub const JUMPI: OpCode = OpCode(0x57);
    pub const PUSH1: OpCode = OpCode(0x60);
    pub const CREATE: OpCode = OpCode(0xf0);
    pub const CALL: OpCode = OpCode(0xf1);
    pub const CALLCODE: OpCode = OpCode(0xf2);
    pub const RETURN: OpCode = OpCode(0xf3);
    pub const DELEGATECALL: OpCode = OpCode(0xf4);
    pub const CREATE2: OpCode = OpCode(0xf5);
    pub const STATICCALL: OpCode = OpCode(0xfa);
    pub const REVERT: OpCode = OpCode(0xfd);
    pub const INVALID: OpCode = OpCode(0xfe);
    pub const SELFDESTRUCT: OpCode = OpCode(0xff);

    const NAMES: &'static [(OpCode, &'static str)] = &[
        (OpCode::STOP, "STOP"),
        (OpCode::ADD, "ADD"),
        (OpCode::BALANCE, "BALANCE"),
        (OpCode::EXTCODESIZE, "EXTCODESIZE"),
        (OpCode::EXTCODECOPY, "EXTCODECOPY"),
        (OpCode::EXTCODEHASH, "EXTCODEHASH"),
        (OpCode::POP, "POP"),
        (OpCode::MLOAD, "MLOAD"),
        (OpCode::MSTORE, "MSTORE"),
        (OpCode::SLOAD, "SLOAD"),
        (OpCode::SSTORE, "SSTORE"),
        (OpCode::JUMP, "JUMP"),
        (OpCode::JUMPI, "JUMPI"),
        (OpCode::PUSH1, "PUSH1"),
        (OpCode::CREATE, "CREATE"),
        (OpCode::CALL, "CALL"),
        (OpCode::CALLCODE, "CALLCODE"),
        (OpCode::RETURN, "RETURN"),
        (OpCode::DELEGATECALL, "DELEGATECALL"),
        (OpCode::CREATE2, "CREATE2"),
        (OpCode::STATICCALL, "STATICCALL"),
        (OpCode::REVERT, "REVERT"),
        (OpCode::INVALID, "INVALID"),
        (OpCode::SELFDESTRUCT, "SELFDESTRUCT"),
    ];

    /// Mnemonic, if this opcode is one of the named ones
    pub fn name(self) -> Option<&'static str> {
        Self::NAMES
            .iter()
            .find(|(op, _)| *op == self)
            .map(|(_, name)| *name)
    }

    /// CALL, CALLCODE, DELEGATECALL or STATICCALL
    pub fn is_call(self) -> bool {
        matches!(
            self,
            OpCode::CALL | OpCode::CALLCODE | OpCode::DELEGATECALL | OpCode::STATICCALL
        )
    }

    pub fn is_create(self) -> bool {
        matches!(self, OpCode::CREATE | OpCode::CREATE2)
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:02x}", self.0),
        }
    }
}

impl FromStr for OpCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(hex) = s.strip_prefix("0x") {
            return u8::from_str_radix(hex, 16)
                .map(OpCode)
                .map_err(|e| format!("invalid opcode byte {}: {}", s, e));
        }

        // SUICIDE is the pre-EIP-6 spelling
        let upper = s.to_ascii_uppercase();
        let upper = if upper == "SUICIDE" { "SELFDESTRUCT".to_string() } else { upper };

        Self::NAMES
            .iter()
            .find(|(_, name)| *name == upper)
            .map(|(op, _)| *op)
            .ok_or_else(|| format!("unknown opcode: {}", s))
    }
}

impl TryFrom<String> for OpCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OpCode> for String {
    fn from(op: OpCode) -> Self {
        op.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_names() {
        assert_eq!(OpCode::CREATE2.to_string(), "CREATE2");
        assert_eq!(OpCode(0x0c).to_string(), "0x0c");
        assert_eq!("staticcall".parse::<OpCode>().unwrap(), OpCode::STATICCALL);
        assert_eq!("SUICIDE".parse::<OpCode>().unwrap(), OpCode::SELFDESTRUCT);
        assert_eq!("0xf1".parse::<OpCode>().unwrap(), OpCode::CALL);
        assert!("NOPE".parse::<OpCode>().is_err());
    }

    #[test]
    fn test_opcode_serde() {
        let json = serde_json::to_string(&OpCode::DELEGATECALL).unwrap();
        assert_eq!(json, "\"DELEGATECALL\"");

        let op: OpCode = serde_json::from_str("\"SSTORE\"").unwrap();
        assert_eq!(op, OpCode::SSTORE);
    }

    #[test]
    fn test_opcode_families() {
        assert!(OpCode::CALLCODE.is_call());
        assert!(!OpCode::CREATE.is_call());
        assert!(OpCode::CREATE2.is_create());
        assert!(!OpCode::SELFDESTRUCT.is_create());
    }
}
