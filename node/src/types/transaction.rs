use std::fmt::{self, Display, Formatter};

use datasize::DataSize;
use serde::{Deserialize, Serialize};

use meridian_types::{Address, Digest};

use super::BlockHash;

/// A transaction as observed by the consensus layer: the recovered
/// sender, the recipient and the call payload. Pool admission and
/// execution semantics live elsewhere.
#[derive(Clone, DataSize, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    sender: Address,
    recipient: Address,
    data: Vec<u8>,
}

impl Transaction {
    /// Constructs a new transaction.
    pub fn new(sender: Address, recipient: Address, data: Vec<u8>) -> Self {
        Transaction {
            sender,
            recipient,
            data,
        }
    }

    /// The recovered sender address.
    pub fn sender(&self) -> Address {
        self.sender
    }

    /// The recipient address.
    pub fn recipient(&self) -> Address {
        self.recipient
    }

    /// The call payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// For a confirming ("sign") transaction, the hash of the block
    /// being confirmed: the trailing 32 bytes of the payload. Returns
    /// `None` when the payload is too short to name a block.
    pub fn confirmed_block_hash(&self) -> Option<BlockHash> {
        if self.data.len() < Digest::LENGTH {
            return None;
        }
        let trailing = &self.data[self.data.len() - Digest::LENGTH..];
        Digest::try_from(trailing).ok().map(BlockHash::new)
    }
}

impl Display for Transaction {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(
            formatter,
            "transaction from {} to {} ({} payload bytes)",
            self.sender,
            self.recipient,
            self.data.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_confirmed_block_hash_from_trailing_bytes() {
        let confirmed = BlockHash::new(Digest::hash(b"confirmed block"));
        let mut data = vec![0xe3, 0x41, 0xea, 0xa4];
        data.extend_from_slice(&[0; 32]);
        data.extend_from_slice(confirmed.as_ref());
        let tx = Transaction::new(Address::zero(), Address::zero(), data);
        assert_eq!(tx.confirmed_block_hash(), Some(confirmed));
    }

    #[test]
    fn short_payload_names_no_block() {
        let tx = Transaction::new(Address::zero(), Address::zero(), vec![1, 2, 3]);
        assert_eq!(tx.confirmed_block_hash(), None);
    }
}
