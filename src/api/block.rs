//! Block-level trace lists (`trace_block` shape).

use crate::parity::{reward_traces, BlockRewards, ParityTrace, RewardPlacement};
use alloy_primitives::B256;
use log::debug;
use serde::{Deserialize, Serialize};

/// Call traces of one transaction, in block order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxTraces {
    #[serde(default)]
    pub hash: Option<B256>,

    pub traces: Vec<ParityTrace>,
}

/// Concatenate per-transaction traces into one block list
///
/// Each transaction trace gets the block coordinates plus its hash and
/// position; reward traces get the block coordinates only.
pub fn assemble_block(
    block_hash: B256,
    block_number: u64,
    transactions: Vec<TxTraces>,
    rewards: Option<&BlockRewards>,
    placement: RewardPlacement,
) -> Vec<ParityTrace> {
    let mut body = Vec::new();
    for (position, tx) in transactions.into_iter().enumerate() {
        for mut trace in tx.traces {
            trace.localize(block_hash, block_number, tx.hash, Some(position as u64));
            body.push(trace);
        }
    }

    let mut rewards: Vec<ParityTrace> = rewards.map(reward_traces).unwrap_or_default();
    for trace in rewards.iter_mut() {
        trace.localize(block_hash, block_number, None, None);
    }

    debug!(
        "Assembled block {}: {} traces, {} rewards",
        block_number,
        body.len(),
        rewards.len()
    );

    match placement {
        RewardPlacement::Append => {
            body.extend(rewards);
            body
        }
        RewardPlacement::Prepend => {
            rewards.extend(body);
            rewards
        }
    }
}
