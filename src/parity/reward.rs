//! Synthetic `reward` traces appended to block-level trace lists.
//!
//! Reward amounts come from the consensus rules; this module only shapes them.

use super::trace::{Action, ParityTrace, ResultSlot, RewardAction, RewardType};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Rewards paid for one block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRewards {
    /// Block author (coinbase)
    pub author: Address,

    /// Miner reward, including any uncle inclusion bonus
    pub value: U256,

    /// `(uncle coinbase, uncle reward)` in uncle order
    #[serde(default)]
    pub uncles: Vec<(Address, U256)>,
}

/// Where reward traces go relative to the transaction traces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RewardPlacement {
    #[default]
    Append,
    Prepend,
}

/// Build one `reward` trace
pub fn reward_trace(author: Address, value: U256, reward_type: RewardType) -> ParityTrace {
    ParityTrace::new(
        Action::Reward(RewardAction {
            author,
            reward_type,
            value,
        }),
        ResultSlot::Null,
        None,
    )
}

/// The miner's `block` reward followed by one `uncle` reward per uncle
pub fn reward_traces(rewards: &BlockRewards) -> Vec<ParityTrace> {
    std::iter::once(reward_trace(rewards.author, rewards.value, RewardType::Block))
        .chain(
            rewards
                .uncles
                .iter()
                .map(|(author, value)| reward_trace(*author, *value, RewardType::Uncle)),
        )
        .collect()
}
