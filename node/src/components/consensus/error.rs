use thiserror::Error;

use meridian_types::Address;

use crate::types::BlockHash;

use super::traits::{ContractError, PoolError, SealError};

/// Errors raised by the PoSV consensus component.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested block is not known to the chain.
    #[error("unknown block")]
    UnknownBlock,

    /// An ancestor header needed to derive a snapshot or tally an
    /// epoch is missing, e.g. on a pruned chain. Validity cannot be
    /// determined without it.
    #[error("missing ancestor header #{number} ({hash})")]
    MissingAncestor {
        /// Height of the missing header.
        number: u64,
        /// Hash of the missing header.
        hash: BlockHash,
    },

    /// A header expected at a canonical height is missing.
    #[error("missing header at height {0}")]
    MissingHeader(u64),

    /// A block body needed for the confirming-transaction scan is
    /// missing.
    #[error("missing block #{number} ({hash})")]
    MissingBlock {
        /// Height of the missing block.
        number: u64,
        /// Hash of the missing block.
        hash: BlockHash,
    },

    /// The checkpoint header's embedded validator list does not match
    /// the independently derived list. The block must be rejected.
    #[error("checkpoint validator list does not match the derived list")]
    InvalidCheckpointValidators,

    /// A checkpoint header that should carry a validator list carries
    /// none.
    #[error("checkpoint header carries no validator list")]
    EmptyValidatorList,

    /// There are no masternode candidates to derive a validator list
    /// from.
    #[error("no masternode candidates to derive validators from")]
    NoCandidates,

    /// The block's recovered producer is not in the epoch's
    /// authorized signer set.
    #[error("block producer {0} is not an authorized signer")]
    UnknownProducer(Address),

    /// The foundation wallet address is required at reward
    /// checkpoints but is not configured.
    #[error("foundation wallet address is not configured")]
    MissingFoundationWallet,

    /// The reward split percentages do not sum to 100.
    #[error("reward split percentages must sum to 100")]
    InvalidRewardSplit,

    /// The local signing address has not been configured.
    #[error("local signing address is not configured")]
    MissingLocalAddress,

    /// A governance contract read failed.
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// The signature scheme failed to sign or recover.
    #[error(transparent)]
    Seal(#[from] SealError),

    /// The transaction pool rejected a confirming transaction.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// Metric registration failed at construction time.
    #[error(transparent)]
    Metrics(#[from] prometheus::Error),
}
