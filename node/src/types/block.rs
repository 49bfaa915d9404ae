use std::fmt::{self, Display, Formatter};

use datasize::DataSize;
use derive_more::From;
use serde::{Deserialize, Serialize};

use meridian_types::{pack_address_list, unpack_address_list, Address, Digest, Signature};

use super::Transaction;

/// A cryptographic hash identifying a block.
#[derive(
    Copy,
    Clone,
    DataSize,
    Default,
    Ord,
    PartialOrd,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    Debug,
    From,
)]
pub struct BlockHash(Digest);

impl BlockHash {
    /// Constructs a new `BlockHash`.
    pub fn new(hash: Digest) -> Self {
        BlockHash(hash)
    }

    /// Returns the wrapped inner hash.
    pub fn inner(&self) -> &Digest {
        &self.0
    }
}

impl AsRef<[u8]> for BlockHash {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl Display for BlockHash {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "block-hash({})", self.0)
    }
}

/// A block header.
///
/// The `validators` and `penalties` fields are only set on checkpoint
/// headers (heights that are a multiple of the epoch length); the
/// `validator` field carries the second validator's co-signature and
/// is appended after sealing. All fields are written exactly once, at
/// block-sealing time.
#[derive(Clone, DataSize, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// The height of this block.
    number: u64,
    /// The hash of the parent block.
    parent_hash: BlockHash,
    /// The producer's seal over [`Header::seal_digest`].
    seal: Signature,
    /// Packed address list of the epoch's ordered validator set.
    validators: Vec<u8>,
    /// Packed address list of the masternodes excluded at this
    /// checkpoint.
    penalties: Vec<u8>,
    /// The second validator's co-signature over [`Header::seal_digest`].
    validator: Signature,
}

impl Header {
    /// Constructs a new header. Checkpoint fields are attached with
    /// [`Header::with_validators`] and [`Header::with_penalties`].
    pub fn new(number: u64, parent_hash: BlockHash, seal: Signature) -> Self {
        Header {
            number,
            parent_hash,
            seal,
            validators: Vec::new(),
            penalties: Vec::new(),
            validator: Signature::default(),
        }
    }

    /// Attaches the checkpoint's packed validator list.
    pub fn with_validators(mut self, validators: Vec<u8>) -> Self {
        self.validators = validators;
        self
    }

    /// Attaches the checkpoint's packed penalty list.
    pub fn with_penalties(mut self, penalties: &[Address]) -> Self {
        self.penalties = pack_address_list(penalties);
        self
    }

    /// The height of this block.
    pub fn number(&self) -> u64 {
        self.number
    }

    /// The hash of the parent block.
    pub fn parent_hash(&self) -> &BlockHash {
        &self.parent_hash
    }

    /// The producer's seal.
    pub fn seal(&self) -> &Signature {
        &self.seal
    }

    /// The raw packed validator list.
    pub fn validators(&self) -> &[u8] {
        &self.validators
    }

    /// The checkpoint's ordered validator addresses.
    pub fn validator_addresses(&self) -> Vec<Address> {
        unpack_address_list(&self.validators)
    }

    /// The checkpoint's excluded masternode addresses.
    pub fn penalty_addresses(&self) -> Vec<Address> {
        unpack_address_list(&self.penalties)
    }

    /// The second validator's co-signature, if it has been appended.
    pub fn validator_seal(&self) -> &Signature {
        &self.validator
    }

    /// Appends the second validator's co-signature.
    pub fn set_validator_seal(&mut self, signature: Signature) {
        self.validator = signature;
    }

    /// The block identity.
    ///
    /// The co-signature is excluded so the identity is stable across
    /// the two signing phases; confirming transactions and caches
    /// keyed by hash refer to the same block before and after the
    /// second validator signs.
    pub fn hash(&self) -> BlockHash {
        let serialized = bincode::serialize(&(
            self.number,
            &self.parent_hash,
            &self.seal,
            &self.validators,
            &self.penalties,
        ))
        .expect("serialize header");
        BlockHash(Digest::hash(&serialized))
    }

    /// The digest signed by the producer and by the second validator.
    pub fn seal_digest(&self) -> Digest {
        let serialized = bincode::serialize(&(
            self.number,
            &self.parent_hash,
            &self.validators,
            &self.penalties,
        ))
        .expect("serialize header");
        Digest::hash(&serialized)
    }
}

impl Display for Header {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(
            formatter,
            "header #{} (parent {})",
            self.number, self.parent_hash
        )
    }
}

/// A block: a header plus the transactions it contains.
#[derive(Clone, DataSize, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Block {
    header: Header,
    transactions: Vec<Transaction>,
}

impl Block {
    /// Constructs a new block.
    pub fn new(header: Header, transactions: Vec<Transaction>) -> Self {
        Block {
            header,
            transactions,
        }
    }

    /// The block header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The transactions contained in the block.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// The block identity.
    pub fn hash(&self) -> BlockHash {
        self.header.hash()
    }

    /// Splits the block into its header and body, for rebuilding with
    /// an amended header.
    pub fn into_parts(self) -> (Header, Vec<Transaction>) {
        (self.header, self.transactions)
    }
}

impl Display for Block {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(
            formatter,
            "block #{} ({}, {} transactions)",
            self.header.number,
            self.hash(),
            self.transactions.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> Header {
        Header::new(
            7,
            BlockHash::new(Digest::hash(b"parent")),
            Signature::new(vec![1; 65]),
        )
    }

    #[test]
    fn hash_is_stable_across_co_signing() {
        let mut header = sample_header();
        let before = header.hash();
        header.set_validator_seal(Signature::new(vec![2; 65]));
        assert_eq!(before, header.hash());
    }

    #[test]
    fn hash_covers_checkpoint_fields() {
        let base = sample_header();
        let with_validators = sample_header().with_validators(vec![0xab; Address::LENGTH]);
        assert_ne!(base.hash(), with_validators.hash());
    }

    #[test]
    fn seal_digest_excludes_the_seal_itself() {
        let sealed = sample_header();
        let resealed = Header::new(
            7,
            BlockHash::new(Digest::hash(b"parent")),
            Signature::new(vec![9; 65]),
        );
        assert_eq!(sealed.seal_digest(), resealed.seal_digest());
        assert_ne!(sealed.hash(), resealed.hash());
    }

    #[test]
    fn checkpoint_fields_round_trip() {
        let validators = vec![Address::new([3; Address::LENGTH]), Address::new([4; Address::LENGTH])];
        let penalties = vec![Address::new([5; Address::LENGTH])];
        let header = sample_header()
            .with_validators(pack_address_list(&validators))
            .with_penalties(&penalties);
        assert_eq!(header.validator_addresses(), validators);
        assert_eq!(header.penalty_addresses(), penalties);
    }
}
