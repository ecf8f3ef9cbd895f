//! Translation of VM error strings into the names Parity clients expect.

/// Exact-match translations
const PARITY_ERRORS: &[(&str, &str)] = &[
    ("contract creation code storage out of gas", "Out of gas"),
    ("out of gas", "Out of gas"),
    ("gas uint64 overflow", "Out of gas"),
    ("max code size exceeded", "Out of gas"),
    ("invalid jump destination", "Bad jump destination"),
    ("execution reverted", "Reverted"),
    ("return data out of bounds", "Out of bounds"),
    ("stack limit reached 1024 (1023)", "Out of stack"),
    ("precompiled failed", "Built-in failed"),
    ("invalid input length", "Built-in failed"),
];

/// Prefix translations, tried after the exact table
const PARITY_ERROR_PREFIXES: &[(&str, &str)] = &[
    ("invalid opcode:", "Bad instruction"),
    ("stack underflow", "Stack underflow"),
];

/// Translate a VM error; unrecognized errors pass through verbatim
pub fn to_parity_error(vm_error: &str) -> String {
    if let Some((_, parity)) = PARITY_ERRORS.iter().find(|(vm, _)| *vm == vm_error) {
        return (*parity).to_string();
    }

    PARITY_ERROR_PREFIXES
        .iter()
        .find(|(prefix, _)| vm_error.starts_with(*prefix))
        .map(|(_, parity)| (*parity).to_string())
        .unwrap_or_else(|| vm_error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_matches() {
        assert_eq!(to_parity_error("out of gas"), "Out of gas");
        assert_eq!(
            to_parity_error("contract creation code storage out of gas"),
            "Out of gas"
        );
        assert_eq!(to_parity_error("gas uint64 overflow"), "Out of gas");
        assert_eq!(to_parity_error("max code size exceeded"), "Out of gas");
        assert_eq!(to_parity_error("invalid jump destination"), "Bad jump destination");
        assert_eq!(to_parity_error("execution reverted"), "Reverted");
        assert_eq!(to_parity_error("return data out of bounds"), "Out of bounds");
        assert_eq!(to_parity_error("stack limit reached 1024 (1023)"), "Out of stack");
        assert_eq!(to_parity_error("precompiled failed"), "Built-in failed");
        assert_eq!(to_parity_error("invalid input length"), "Built-in failed");
    }

    #[test]
    fn test_prefix_matches() {
        assert_eq!(to_parity_error("invalid opcode: 0xfe"), "Bad instruction");
        assert_eq!(to_parity_error("stack underflow (0 <=> 2)"), "Stack underflow");
    }

    #[test]
    fn test_unknown_passes_through() {
        assert_eq!(to_parity_error("insufficient balance for transfer"), "insufficient balance for transfer");
        // Exact table only matches whole strings
        assert_eq!(to_parity_error("out of gas: not enough"), "out of gas: not enough");
    }
}
