use datasize::DataSize;
use serde::{Deserialize, Serialize};

use meridian_types::Address;

use super::Error;

/// PoSV protocol configuration.
///
/// NOTE: unlike node-local tuning, every field here is consensus
/// critical and must be identical on all nodes of a network.
#[derive(Clone, DataSize, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// The chain's network id.
    pub network_id: u64,
    /// The number of blocks in an epoch. Heights that are a multiple
    /// of this are checkpoints.
    pub epoch_length: u64,
    /// The interval, in blocks, between reward distributions.
    pub reward_checkpoint: u64,
    /// The maximum number of masternodes in the active set.
    pub max_masternodes: usize,
    /// A masternode producing fewer blocks than this per epoch is
    /// penalized. Producing exactly this many is sufficient.
    pub min_blocks_per_epoch: u64,
    /// How many epochs a penalty lasts before the masternode becomes
    /// eligible for comeback.
    pub limit_penalty_epoch: u64,
    /// How many trailing blocks the comeback scan inspects for
    /// resumed signing.
    pub range_return_signer: u64,
    /// Confirming transactions are expected for heights that are a
    /// multiple of this.
    pub merge_sign_range: u64,
    /// Blocks per year; the reward halving thresholds are multiples
    /// of this.
    pub blocks_per_year: u64,
    /// The base reward per reward checkpoint, in whole tokens.
    pub base_reward: u64,
    /// The wallet receiving the foundation's share of each reward.
    /// The zero address means "not configured", which is fatal at
    /// reward checkpoints.
    pub foundation_wallet: Address,
    /// Percentage of a signer's reward kept by the masternode.
    pub reward_master_percent: u64,
    /// Percentage of a signer's reward split across its stake-backers.
    pub reward_voter_percent: u64,
    /// Percentage of a signer's reward paid to the foundation wallet.
    pub reward_foundation_percent: u64,
    /// Height from which confirming transactions are only required at
    /// merge-sign boundaries. `None` means the relaxation never
    /// activates.
    pub relaxed_signing_activation: Option<u64>,
    /// Height from which the penalty policy switches from the legacy
    /// confirmation scan to the signing-lookback tally.
    pub lookback_penalty_activation: Option<u64>,
    /// Height from which the published penalty list contains the
    /// epoch's under-producers in addition to the unrehabilitated
    /// comeback candidates.
    pub full_penalty_activation: Option<u64>,
    /// Whether a confirmation of a block that is not on a merge-sign
    /// boundary counts as comeback evidence.
    pub count_unaligned_confirmations: bool,
}

impl Config {
    /// The checkpoint at or below the given height.
    pub fn checkpoint_number(&self, number: u64) -> u64 {
        number - number % self.epoch_length
    }

    /// Returns `true` if the height is a checkpoint.
    pub fn is_checkpoint(&self, number: u64) -> bool {
        number % self.epoch_length == 0
    }

    /// Returns `true` if the relaxed signing rule is active at the
    /// given height.
    pub fn relaxed_signing_active(&self, number: u64) -> bool {
        activated(self.relaxed_signing_activation, number)
    }

    /// Returns `true` if the signing-lookback penalty policy is
    /// active at the given height.
    pub fn lookback_penalty_active(&self, number: u64) -> bool {
        activated(self.lookback_penalty_activation, number)
    }

    /// Returns `true` if checkpoints at the given height publish the
    /// full penalty list.
    pub fn full_penalty_active(&self, number: u64) -> bool {
        activated(self.full_penalty_activation, number)
    }

    pub(super) fn validate(&self) -> Result<(), Error> {
        if self.reward_master_percent + self.reward_voter_percent + self.reward_foundation_percent
            != 100
        {
            return Err(Error::InvalidRewardSplit);
        }
        Ok(())
    }
}

fn activated(activation: Option<u64>, number: u64) -> bool {
    matches!(activation, Some(height) if number >= height)
}

impl Default for Config {
    fn default() -> Self {
        Config {
            network_id: 50,
            epoch_length: 900,
            reward_checkpoint: 900,
            max_masternodes: 150,
            min_blocks_per_epoch: 1,
            limit_penalty_epoch: 4,
            range_return_signer: 150,
            merge_sign_range: 15,
            blocks_per_year: 15_768_000,
            base_reward: 250,
            foundation_wallet: Address::zero(),
            reward_master_percent: 40,
            reward_voter_percent: 50,
            reward_foundation_percent: 10,
            relaxed_signing_activation: Some(0),
            lookback_penalty_activation: Some(0),
            full_penalty_activation: Some(0),
            count_unaligned_confirmations: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_arithmetic() {
        let config = Config {
            epoch_length: 900,
            ..Config::default()
        };
        assert_eq!(config.checkpoint_number(0), 0);
        assert_eq!(config.checkpoint_number(899), 0);
        assert_eq!(config.checkpoint_number(900), 900);
        assert_eq!(config.checkpoint_number(1801), 1800);
        assert!(config.is_checkpoint(1800));
        assert!(!config.is_checkpoint(1801));
    }

    #[test]
    fn activation_heights_are_inclusive() {
        let config = Config {
            lookback_penalty_activation: Some(100),
            relaxed_signing_activation: None,
            ..Config::default()
        };
        assert!(!config.lookback_penalty_active(99));
        assert!(config.lookback_penalty_active(100));
        assert!(!config.relaxed_signing_active(u64::MAX));
    }

    #[test]
    fn default_reward_split_is_valid() {
        assert!(Config::default().validate().is_ok());
        let broken = Config {
            reward_master_percent: 41,
            ..Config::default()
        };
        assert!(matches!(broken.validate(), Err(Error::InvalidRewardSplit)));
    }
}
