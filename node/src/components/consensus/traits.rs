//! Interfaces the consensus component consumes from the rest of the
//! node.
//!
//! The engine never reaches into the chain database, the governance
//! contracts or the wallet directly; it sees them only through these
//! traits, injected at construction time.

use thiserror::Error;

use meridian_types::{Address, Digest, Signature, U256};

use crate::types::{Block, BlockHash, Header, Transaction};

use super::Masternode;

/// Error from a governance contract read.
#[derive(Debug, Error)]
#[error("governance contract read failed: {0}")]
pub struct ContractError(pub String);

/// Error from the signature scheme.
#[derive(Debug, Error)]
#[error("seal operation failed: {0}")]
pub struct SealError(pub String);

/// Error submitting a transaction to the pool.
#[derive(Debug, Error)]
#[error("transaction pool rejected submission: {0}")]
pub struct PoolError(pub String);

/// Read access to the canonical chain and its forks.
pub trait ChainReader: Send + Sync {
    /// The chain head header.
    fn current_header(&self) -> Header;

    /// The canonical header at the given height.
    fn header_by_number(&self, number: u64) -> Option<Header>;

    /// The header with the given hash, on any known fork.
    fn header_by_hash(&self, hash: &BlockHash) -> Option<Header>;

    /// The header with the given hash, verified to sit at the given
    /// height.
    fn header(&self, hash: &BlockHash, number: u64) -> Option<Header>;

    /// The full block with the given hash and height.
    fn block(&self, hash: &BlockHash, number: u64) -> Option<Block>;
}

/// Post-state balance mutation, used by the reward distributor to
/// credit masternodes, stake-backers and the foundation wallet.
pub trait StateWriter {
    /// Adds `amount` to the balance of `address`.
    fn add_balance(&mut self, address: Address, amount: U256);
}

/// Read access to governance contract state.
///
/// Every method takes the hash of the block whose post-state the read
/// is evaluated against, so producer and importers resolve the same
/// values.
pub trait GovernanceReader: Send + Sync {
    /// All masternode candidates known to the voting contract.
    fn candidates(&self, at: &BlockHash) -> Result<Vec<Address>, ContractError>;

    /// The stake voted behind a candidate.
    fn candidate_stake(&self, at: &BlockHash, candidate: Address) -> Result<U256, ContractError>;

    /// The candidate's committed randomization secret.
    fn randomize_secret(&self, at: &BlockHash, candidate: Address) -> Result<u64, ContractError>;

    /// The addresses that confirmed the given block via the block
    /// signer contract.
    fn block_confirmers(
        &self,
        at: &BlockHash,
        confirmed: &BlockHash,
    ) -> Result<Vec<Address>, ContractError>;

    /// The stake-backers of a candidate, with their stakes.
    fn stake_backers(
        &self,
        at: &BlockHash,
        candidate: Address,
    ) -> Result<Vec<Masternode>, ContractError>;
}

/// Recovery of the producer address from a sealed header. The
/// concrete signature scheme lives outside the consensus core.
pub trait SealRecovery: Send + Sync {
    /// Recovers the address that sealed the header.
    fn recover_producer(&self, header: &Header) -> Result<Address, SealError>;
}

/// The local signing capability: produce a signature over a digest
/// with the key held for the given address.
pub trait SignHash: Send + Sync {
    /// Signs the digest, failing if no key material is available for
    /// the address.
    fn sign_hash(&self, address: Address, digest: Digest) -> Result<Signature, SealError>;
}

/// Sink for locally authored confirming transactions.
pub trait SignTransactionPool: Send + Sync {
    /// Submits the transaction for inclusion in a future block.
    fn submit(&self, transaction: Transaction) -> Result<(), PoolError>;
}
