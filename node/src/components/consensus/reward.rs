//! Block reward computation and distribution.
//!
//! Runs at multiples of the reward checkpoint interval, never per
//! block. The inflation-adjusted reward is split across the epoch's
//! signers by production share; each signer's slice is then split
//! between the masternode, its stake-backers and the foundation
//! wallet.

use std::{collections::BTreeMap, time::Instant};

use datasize::DataSize;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use meridian_types::{Address, U256};

use crate::types::Header;

use super::{
    traits::{ChainReader, StateWriter},
    Error, Posv,
};

/// A signer's entry in the reward record: its production share and
/// the slice of the checkpoint reward attributed to it.
#[derive(Clone, DataSize, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SignerReward {
    /// Blocks produced by the signer within the reward interval.
    pub sign_count: u64,
    /// The signer's slice of the checkpoint reward.
    pub reward: U256,
}

/// The per-checkpoint reward artifact: which signers were paid and
/// how each signer's payout was split among the credited addresses.
/// Produced once per reward checkpoint and never mutated afterwards;
/// persistence is the caller's concern.
#[derive(Clone, DataSize, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RewardRecord {
    /// Per-signer production share and attributed reward.
    pub signers: BTreeMap<Address, SignerReward>,
    /// Per-signer split: credited address to credited amount.
    pub rewards: BTreeMap<Address, BTreeMap<Address, U256>>,
}

impl Posv {
    /// Computes and credits the checkpoint reward, returning the
    /// immutable record of the distribution.
    ///
    /// Balances are credited into `state` (the post-state of the
    /// checkpoint block); stake lookups are evaluated against the
    /// checkpoint's parent. A missing foundation wallet is a fatal
    /// configuration error. A split failure for a single signer is
    /// logged and skips that signer only.
    pub fn reward(
        &self,
        chain: &dyn ChainReader,
        state: &mut dyn StateWriter,
        header: &Header,
    ) -> Result<RewardRecord, Error> {
        let number = header.number();
        let interval = self.config.reward_checkpoint;
        if number == 0 || number % interval != 0 {
            return Ok(RewardRecord::default());
        }
        if self.config.foundation_wallet.is_zero() {
            error!("foundation wallet address is empty");
            return Err(Error::MissingFoundationWallet);
        }

        let start = Instant::now();
        let chain_reward = halved_reward(
            U256::from(self.config.base_reward) * U256::exp10(18),
            number,
            self.config.blocks_per_year,
        );

        let tally = self.tally_producers(chain, header, interval)?;
        let total_signed: u64 = tally.produced.values().sum();
        let mut record = RewardRecord::default();
        if total_signed == 0 {
            return Ok(record);
        }

        for (signer, sign_count) in &tally.produced {
            let signer_reward = chain_reward * U256::from(*sign_count) / U256::from(total_signed);
            record.signers.insert(
                *signer,
                SignerReward {
                    sign_count: *sign_count,
                    reward: signer_reward,
                },
            );
            match self.split_for_backers(header, *signer, signer_reward) {
                Ok(split) => {
                    for (credited, amount) in &split {
                        state.add_balance(*credited, *amount);
                    }
                    record.rewards.insert(*signer, split);
                }
                Err(err) => {
                    // An unsplittable signer is an integrity problem,
                    // but must not starve the remaining signers.
                    error!(%signer, %err, "failed to split reward for stake-backers");
                }
            }
        }

        self.metrics
            .reward_computation_time
            .set(start.elapsed().as_secs_f64());
        debug!(
            block = number,
            elapsed = ?start.elapsed(),
            signers = record.signers.len(),
            "reward distribution finished"
        );
        Ok(record)
    }

    /// Splits one signer's reward: the master share to the masternode
    /// itself, the voter share across its stake-backers proportional
    /// to stake, and the foundation share to the foundation wallet.
    /// With no backers (or zero total stake) the voter share falls
    /// back to the masternode.
    fn split_for_backers(
        &self,
        header: &Header,
        signer: Address,
        reward: U256,
    ) -> Result<BTreeMap<Address, U256>, Error> {
        let at = header.parent_hash();
        let backers = self.governance.stake_backers(at, signer)?;

        let master = reward * U256::from(self.config.reward_master_percent) / U256::from(100u64);
        let voter_pool = reward * U256::from(self.config.reward_voter_percent) / U256::from(100u64);
        let foundation =
            reward * U256::from(self.config.reward_foundation_percent) / U256::from(100u64);

        let mut split = BTreeMap::new();
        credit(&mut split, self.config.foundation_wallet, foundation);

        let total_stake = backers
            .iter()
            .fold(U256::zero(), |sum, backer| sum + backer.stake);
        if total_stake.is_zero() {
            credit(&mut split, signer, master + voter_pool);
        } else {
            credit(&mut split, signer, master);
            for backer in &backers {
                credit(
                    &mut split,
                    backer.address,
                    voter_pool * backer.stake / total_stake,
                );
            }
        }
        Ok(split)
    }
}

fn credit(split: &mut BTreeMap<Address, U256>, address: Address, amount: U256) {
    if amount.is_zero() {
        return;
    }
    *split.entry(address).or_insert_with(U256::zero) += amount;
}

/// Applies the halving schedule: the reward is halved once the height
/// passes twice `blocks_per_year` and quartered once it passes five
/// times `blocks_per_year`. Thresholds are absolute heights.
pub(super) fn halved_reward(base: U256, number: u64, blocks_per_year: u64) -> U256 {
    if number >= 5 * blocks_per_year {
        base / U256::from(4u64)
    } else if number >= 2 * blocks_per_year {
        base / U256::from(2u64)
    } else {
        base
    }
}
