//! The two-phase block-signing protocol.
//!
//! The producer ("M1") seals a block and, as part of the sealing
//! pipeline, submits a confirming transaction referencing it. Before
//! the block is propagated, a deterministically selected second
//! validator ("M2") appends its co-signature to the header. Both
//! hooks run synchronously inside the pipeline for the block.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use tracing::{debug, error};

use meridian_types::{Address, Digest};

use crate::types::{Block, BlockHash, Header, Transaction};

use super::{
    traits::{ChainReader, SignTransactionPool},
    Error, Posv,
};

/// Method selector of the block signer contract's `sign` call.
const SIGN_SELECTOR: [u8; 4] = [0xe3, 0x41, 0xea, 0xa4];

/// Confirming transactions per block, cached so the comeback scan
/// never re-reads a block body. Entries are written once and read
/// many times.
pub(super) type BlockSignerCache = RwLock<HashMap<BlockHash, Arc<Vec<Transaction>>>>;

impl Posv {
    /// Returns the confirming transactions contained in the given
    /// block, filling the cache on first access.
    pub(super) fn signers_of(
        &self,
        chain: &dyn ChainReader,
        hash: &BlockHash,
        number: u64,
    ) -> Result<Arc<Vec<Transaction>>, Error> {
        {
            let cache = self.block_signers.read().expect("signer cache poisoned");
            if let Some(entry) = cache.get(hash) {
                return Ok(Arc::clone(entry));
            }
        }
        let block = chain.block(hash, number).ok_or(Error::MissingBlock {
            number,
            hash: *hash,
        })?;
        let signer_contract = self.profile.contracts().block_signer;
        let confirmations: Vec<Transaction> = block
            .transactions()
            .iter()
            .filter(|transaction| transaction.recipient() == signer_contract)
            .cloned()
            .collect();

        let mut cache = self.block_signers.write().expect("signer cache poisoned");
        let entry = Arc::clone(
            cache
                .entry(*hash)
                .or_insert_with(|| Arc::new(confirmations)),
        );
        Ok(entry)
    }

    /// Deterministically maps a producer to its designated second
    /// validator: the producer's index in the epoch snapshot's sorted
    /// signer list, modulo-indexed into the checkpoint's permuted
    /// validator list. A pure function of the producer and the
    /// header, stable across all nodes observing the same chain.
    pub fn validator_for(
        &self,
        chain: &dyn ChainReader,
        producer: Address,
        header: &Header,
    ) -> Result<Address, Error> {
        let snapshot = self.snapshot(chain, header)?;
        let signers = snapshot.signer_list();
        let position = signers
            .iter()
            .position(|signer| *signer == producer)
            .ok_or(Error::UnknownProducer(producer))?;
        let checkpoint_header = chain
            .header_by_hash(snapshot.checkpoint_hash())
            .ok_or(Error::UnknownBlock)?;
        let validators = checkpoint_header.validator_addresses();
        if validators.is_empty() {
            return Err(Error::EmptyValidatorList);
        }
        Ok(validators[position % validators.len()])
    }
}

/// Coordinates the two-phase block-signing protocol on behalf of the
/// block-production and block-import pipeline.
pub struct SigningCoordinator {
    engine: Arc<Posv>,
    pool: Arc<dyn SignTransactionPool>,
}

impl SigningCoordinator {
    /// Constructs the coordinator.
    pub fn new(engine: Arc<Posv>, pool: Arc<dyn SignTransactionPool>) -> Self {
        SigningCoordinator { engine, pool }
    }

    /// Sign hook, invoked once a block is sealed.
    ///
    /// If the local node is a recognized signer and the height
    /// requires a confirmation (merge-sign boundary, or any height
    /// before the relaxed signing upgrade), a confirming transaction
    /// referencing the block is submitted to the pool. Not being a
    /// signer is a silent no-op; an undetermined local address is
    /// fatal to the sealing attempt.
    pub fn on_block_sealed(&self, chain: &dyn ChainReader, block: &Block) -> Result<(), Error> {
        let local = match self.engine.local_address() {
            Some(address) => address,
            None => {
                error!("cannot determine local address for confirming transaction");
                return Err(Error::MissingLocalAddress);
            }
        };
        if !self.engine.is_signer(chain, local) {
            return Ok(());
        }
        let number = block.header().number();
        let config = self.engine.config();
        if number % config.merge_sign_range == 0 || !config.relaxed_signing_active(number) {
            let contract = self.engine.profile().contracts().block_signer;
            let transaction = confirming_transaction(local, contract, number, block.hash());
            self.pool.submit(transaction)?;
            debug!(block = number, hash = %block.hash(), "submitted confirming transaction");
        }
        Ok(())
    }

    /// M2 header hook, invoked before a freshly produced block is
    /// propagated.
    ///
    /// Recovers the producer from the seal, resolves the designated
    /// second validator, and — if that is the local node — appends
    /// the co-signature and returns the dual-signed block with
    /// `true`. Otherwise the block is returned unchanged with
    /// `false`. Every failure on this path is fatal to the
    /// propagation attempt; the block is never forwarded half-signed.
    pub fn on_block_produced(
        &self,
        chain: &dyn ChainReader,
        block: Block,
    ) -> Result<(Block, bool), Error> {
        let local = match self.engine.local_address() {
            Some(address) => address,
            None => {
                error!("cannot determine local address for validator seal");
                return Err(Error::MissingLocalAddress);
            }
        };
        let producer = self.engine.producer(block.header())?;
        let validator = self
            .engine
            .validator_for(chain, producer, block.header())?;
        if validator != local {
            return Ok((block, false));
        }
        let (address, capability) = self
            .engine
            .local_signer()
            .ok_or(Error::MissingLocalAddress)?;
        let signature = capability.sign_hash(address, block.header().seal_digest())?;
        let (mut header, transactions) = block.into_parts();
        header.set_validator_seal(signature);
        let signed = Block::new(header, transactions);
        debug!(block = signed.header().number(), hash = %signed.hash(), "appended validator seal");
        Ok((signed, true))
    }
}

/// Builds the confirming transaction naming the given block: the
/// `sign` selector, the 32-byte big-endian height and the 32-byte
/// block hash.
fn confirming_transaction(
    sender: Address,
    contract: Address,
    number: u64,
    confirmed: BlockHash,
) -> Transaction {
    let mut data = Vec::with_capacity(4 + 2 * Digest::LENGTH);
    data.extend_from_slice(&SIGN_SELECTOR);
    let mut padded_number = [0u8; Digest::LENGTH];
    padded_number[Digest::LENGTH - 8..].copy_from_slice(&number.to_be_bytes());
    data.extend_from_slice(&padded_number);
    data.extend_from_slice(confirmed.as_ref());
    Transaction::new(sender, contract, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirming_transaction_names_the_block_in_trailing_bytes() {
        let sender = Address::new([1; Address::LENGTH]);
        let contract = Address::new([2; Address::LENGTH]);
        let confirmed = BlockHash::new(Digest::hash(b"sealed block"));
        let transaction = confirming_transaction(sender, contract, 42, confirmed);
        assert_eq!(transaction.sender(), sender);
        assert_eq!(transaction.recipient(), contract);
        assert_eq!(transaction.confirmed_block_hash(), Some(confirmed));
        assert_eq!(&transaction.data()[..4], &SIGN_SELECTOR);
    }
}
