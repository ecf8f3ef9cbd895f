//! Structural checks over an emitted trace list.
//!
//! A list may hold several transactions' trees back to back (block traces)
//! plus standalone reward traces; each tree must be a pre-order walk whose
//! fan-out matches `subtraces`.

use super::trace::{Action, ParityTrace, ResultSlot, TraceOutput, TraceType};
use crate::utils::error::TraceError;
use log::debug;

struct OpenNode {
    address: Vec<usize>,
    remaining: usize,
    next_child: usize,
}

/// Validate a flattened trace list
///
/// **Public** - used by the `validate` command and tests
///
/// # Errors
/// * `TraceError::InvalidTrace` - first violation found, with the offending index
pub fn validate_traces(traces: &[ParityTrace]) -> Result<(), TraceError> {
    let mut open: Vec<OpenNode> = Vec::new();

    for (index, trace) in traces.iter().enumerate() {
        if trace.action.trace_type() != trace.trace_type {
            return Err(TraceError::invalid(format!(
                "trace {}: type {:?} does not match its action",
                index, trace.trace_type
            )));
        }

        if trace.trace_type == TraceType::Reward {
            if !trace.trace_address.is_empty() || trace.subtraces != 0 {
                return Err(TraceError::invalid(format!(
                    "trace {}: reward traces must be standalone",
                    index
                )));
            }
            continue;
        }

        while open.last().is_some_and(|node| node.remaining == 0) {
            open.pop();
        }

        if trace.trace_address.is_empty() {
            if !open.is_empty() {
                return Err(TraceError::invalid(format!(
                    "trace {}: new root before previous tree was complete",
                    index
                )));
            }
        } else {
            let parent = open.last_mut().ok_or_else(|| {
                TraceError::invalid(format!("trace {}: orphaned trace address", index))
            })?;
            let mut expected = parent.address.clone();
            expected.push(parent.next_child);
            if trace.trace_address != expected {
                return Err(TraceError::invalid(format!(
                    "trace {}: expected trace address {:?}, found {:?}",
                    index, expected, trace.trace_address
                )));
            }
            parent.next_child += 1;
            parent.remaining -= 1;
        }

        open.push(OpenNode {
            address: trace.trace_address.clone(),
            remaining: trace.subtraces,
            next_child: 0,
        });

        check_result(index, trace)?;
    }

    if open.iter().any(|node| node.remaining > 0) {
        return Err(TraceError::invalid("trace list ends with missing subtraces"));
    }

    debug!("Validated {} traces", traces.len());
    Ok(())
}

fn check_result(index: usize, trace: &ParityTrace) -> Result<(), TraceError> {
    let has_output = !matches!(trace.result, ResultSlot::Omitted | ResultSlot::Null);

    match (&trace.action, trace.result.output()) {
        (Action::Suicide(_), Some(_)) => {
            return Err(TraceError::invalid(format!(
                "trace {}: suicide traces carry no result",
                index
            )));
        }
        (Action::Suicide(_), None) => return Ok(()),
        (Action::Create(create), output) => {
            if create.init.is_empty() {
                return Err(TraceError::invalid(format!("trace {}: empty init code", index)));
            }
            if let Some(TraceOutput::Call(_)) = output {
                return Err(TraceError::invalid(format!(
                    "trace {}: create trace with call result",
                    index
                )));
            }
        }
        (Action::Call(_), Some(TraceOutput::Create(_))) => {
            return Err(TraceError::invalid(format!(
                "trace {}: call trace with create result",
                index
            )));
        }
        _ => {}
    }

    if trace.error.is_some() == has_output {
        return Err(TraceError::invalid(format!(
            "trace {}: exactly one of error and result must be present",
            index
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parity::trace::{
        CallAction, CallOutput, CallType, CreateAction, CreateOutput, CreationMethod,
    };
    use alloy_primitives::{Address, Bytes, U256, U64};

    fn call(trace_address: Vec<usize>, subtraces: usize) -> ParityTrace {
        let mut trace = ParityTrace::new(
            Action::Call(CallAction {
                call_type: CallType::Call,
                from: Address::ZERO,
                to: Address::ZERO,
                value: U256::ZERO,
                gas: U64::ZERO,
                input: Bytes::new(),
            }),
            ResultSlot::Output(TraceOutput::Call(CallOutput {
                gas_used: U64::ZERO,
                output: Bytes::new(),
            })),
            None,
        );
        trace.trace_address = trace_address;
        trace.subtraces = subtraces;
        trace
    }

    #[test]
    fn test_valid_tree() {
        let traces = vec![
            call(vec![], 2),
            call(vec![0], 1),
            call(vec![0, 0], 0),
            call(vec![1], 0),
            // second transaction in the same block
            call(vec![], 0),
        ];
        validate_traces(&traces).unwrap();
    }

    #[test]
    fn test_wrong_order_rejected() {
        let traces = vec![call(vec![], 2), call(vec![1], 0), call(vec![0], 0)];
        assert!(validate_traces(&traces).is_err());
    }

    #[test]
    fn test_missing_children_rejected() {
        let traces = vec![call(vec![], 2), call(vec![0], 0)];
        assert!(validate_traces(&traces).is_err());
    }

    #[test]
    fn test_error_and_result_exclusive() {
        let mut trace = call(vec![], 0);
        trace.error = Some("Reverted".to_string());
        assert!(validate_traces(&[trace.clone()]).is_err());

        trace.result = ResultSlot::Omitted;
        validate_traces(&[trace]).unwrap();
    }

    #[test]
    fn test_create_with_empty_init_rejected() {
        let trace = ParityTrace::new(
            Action::Create(CreateAction {
                creation_method: CreationMethod::Create,
                from: Address::ZERO,
                value: U256::ZERO,
                gas: U64::from(60_000),
                init: Bytes::new(),
            }),
            ResultSlot::Output(TraceOutput::Create(CreateOutput {
                address: Address::with_last_byte(1),
                code: Bytes::new(),
                gas_used: U64::from(53_000),
            })),
            None,
        );
        assert!(matches!(
            validate_traces(&[trace]),
            Err(TraceError::InvalidTrace(_))
        ));
    }
}
