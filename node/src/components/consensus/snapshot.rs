//! Authorized-signer snapshots.
//!
//! One snapshot covers an entire epoch. It is derived from the
//! epoch's checkpoint header — the persisted validator list minus the
//! penalties recorded alongside it — and cached by checkpoint hash,
//! so the walk back to the checkpoint is paid once per epoch and
//! fork.

use std::{
    collections::{BTreeSet, HashMap},
    sync::{Arc, RwLock},
};

use datasize::DataSize;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use meridian_types::Address;

use crate::types::{BlockHash, Header};

use super::{traits::ChainReader, Error, Posv};

/// The set of addresses authorized to produce blocks for one epoch.
#[derive(Clone, DataSize, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    checkpoint_number: u64,
    checkpoint_hash: BlockHash,
    signers: BTreeSet<Address>,
}

impl Snapshot {
    /// Derives the snapshot from a checkpoint header: the persisted
    /// validator set minus the masternodes penalized at the same
    /// checkpoint.
    pub(super) fn from_checkpoint(header: &Header) -> Self {
        let mut signers: BTreeSet<Address> = header.validator_addresses().into_iter().collect();
        for penalized in header.penalty_addresses() {
            signers.remove(&penalized);
        }
        Snapshot {
            checkpoint_number: header.number(),
            checkpoint_hash: header.hash(),
            signers,
        }
    }

    /// The height of the checkpoint this snapshot was derived from.
    pub fn checkpoint_number(&self) -> u64 {
        self.checkpoint_number
    }

    /// The hash of the checkpoint this snapshot was derived from.
    pub fn checkpoint_hash(&self) -> &BlockHash {
        &self.checkpoint_hash
    }

    /// Returns `true` if the address may produce blocks this epoch.
    pub fn is_authorized(&self, address: &Address) -> bool {
        self.signers.contains(address)
    }

    /// The authorized signers in address order.
    pub fn signer_list(&self) -> Vec<Address> {
        self.signers.iter().copied().collect()
    }

    /// The number of authorized signers.
    pub fn len(&self) -> usize {
        self.signers.len()
    }

    /// Returns `true` if no signer is authorized.
    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }
}

pub(super) type SnapshotCache = RwLock<HashMap<BlockHash, Arc<Snapshot>>>;

impl Posv {
    /// Returns the snapshot in effect at the given header.
    ///
    /// Walks the header's ancestry back to the most recent checkpoint
    /// at or below it, consulting the cache first. Fails if a
    /// required ancestor header is missing; without it, validity
    /// cannot be determined.
    pub fn snapshot(
        &self,
        chain: &dyn ChainReader,
        header: &Header,
    ) -> Result<Arc<Snapshot>, Error> {
        let checkpoint = self.config.checkpoint_number(header.number());
        let mut current = header.clone();
        while current.number() > checkpoint {
            let number = current.number() - 1;
            let parent_hash = *current.parent_hash();
            current = chain
                .header(&parent_hash, number)
                .ok_or(Error::MissingAncestor {
                    number,
                    hash: parent_hash,
                })?;
        }

        let checkpoint_hash = current.hash();
        {
            let cache = self.snapshots.read().expect("snapshot cache poisoned");
            if let Some(snapshot) = cache.get(&checkpoint_hash) {
                return Ok(Arc::clone(snapshot));
            }
        }

        let snapshot = Arc::new(Snapshot::from_checkpoint(&current));
        debug!(
            checkpoint,
            hash = %checkpoint_hash,
            signers = snapshot.len(),
            "derived signer snapshot"
        );

        // Population is idempotent: if another reader computed the
        // snapshot concurrently, both derive the same value, so keep
        // whichever entry landed first.
        let mut cache = self.snapshots.write().expect("snapshot cache poisoned");
        let entry = Arc::clone(cache.entry(checkpoint_hash).or_insert(snapshot));
        self.metrics.snapshot_cache_entries.set(cache.len() as i64);
        Ok(entry)
    }

    /// Admission-control predicate: is the address authorized to sign
    /// at the chain head?
    ///
    /// Prefers the parent header's snapshot, since the head block may
    /// not have been fully inserted yet when the transaction pool
    /// asks. Never fails outward: lookup errors are logged and mean
    /// "not authorized".
    pub fn is_signer(&self, chain: &dyn ChainReader, address: Address) -> bool {
        let current = chain.current_header();
        let header = if current.number() > 0 {
            chain
                .header(current.parent_hash(), current.number() - 1)
                .unwrap_or(current)
        } else {
            current
        };
        match self.snapshot(chain, &header) {
            Ok(snapshot) => snapshot.is_authorized(&address),
            Err(err) => {
                error!(
                    number = header.number(),
                    hash = %header.hash(),
                    %err,
                    "cannot get snapshot for signer check"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use meridian_types::pack_address_list;

    use super::*;

    fn addr(tag: u8) -> Address {
        Address::new([tag; Address::LENGTH])
    }

    #[test]
    fn checkpoint_penalties_are_subtracted() {
        let validators = vec![addr(1), addr(2), addr(3)];
        let header = Header::new(900, BlockHash::default(), Default::default())
            .with_validators(pack_address_list(&validators))
            .with_penalties(&[addr(2)]);
        let snapshot = Snapshot::from_checkpoint(&header);
        assert_eq!(snapshot.signer_list(), vec![addr(1), addr(3)]);
        assert!(snapshot.is_authorized(&addr(1)));
        assert!(!snapshot.is_authorized(&addr(2)));
        assert_eq!(snapshot.checkpoint_number(), 900);
    }

    #[test]
    fn signer_list_is_address_ordered() {
        let header = Header::new(0, BlockHash::default(), Default::default())
            .with_validators(pack_address_list(&[addr(9), addr(1), addr(5)]));
        let snapshot = Snapshot::from_checkpoint(&header);
        assert_eq!(snapshot.signer_list(), vec![addr(1), addr(5), addr(9)]);
    }
}
