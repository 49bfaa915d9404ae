//! Read-only query surface of the consensus component.
//!
//! RPC transport and service registration are wired by the
//! surrounding node; this type only answers the queries.

use std::sync::Arc;

use meridian_types::Address;

use crate::types::{BlockHash, Header, NetworkInformation};

use super::{traits::ChainReader, Error, Posv, Snapshot};

/// Read-only access to snapshots, signer lists and network
/// information.
pub struct Api {
    chain: Arc<dyn ChainReader>,
    engine: Arc<Posv>,
}

impl Api {
    /// Constructs the query surface.
    pub fn new(chain: Arc<dyn ChainReader>, engine: Arc<Posv>) -> Self {
        Api { chain, engine }
    }

    /// The snapshot at the given height, or at the chain head when
    /// `None`.
    pub fn snapshot_at(&self, number: Option<u64>) -> Result<Arc<Snapshot>, Error> {
        let header = self.header_at(number)?;
        self.engine.snapshot(&*self.chain, &header)
    }

    /// The snapshot at the given block hash.
    pub fn snapshot_at_hash(&self, hash: &BlockHash) -> Result<Arc<Snapshot>, Error> {
        let header = self
            .chain
            .header_by_hash(hash)
            .ok_or(Error::UnknownBlock)?;
        self.engine.snapshot(&*self.chain, &header)
    }

    /// The authorized signers at the given height, or at the chain
    /// head when `None`.
    pub fn signers_at(&self, number: Option<u64>) -> Result<Vec<Address>, Error> {
        Ok(self.snapshot_at(number)?.signer_list())
    }

    /// The authorized signers at the given block hash.
    pub fn signers_at_hash(&self, hash: &BlockHash) -> Result<Vec<Address>, Error> {
        Ok(self.snapshot_at_hash(hash)?.signer_list())
    }

    /// The network id and the profile's well-known contract
    /// addresses.
    pub fn network_information(&self) -> NetworkInformation {
        let contracts = self.engine.profile().contracts();
        NetworkInformation {
            network_id: self.engine.config().network_id,
            masternode_voting: contracts.masternode_voting,
            block_signer: contracts.block_signer,
            randomize: contracts.randomize,
            relayer_registry: contracts.relayer_registry,
            lending_registry: contracts.lending_registry,
        }
    }

    fn header_at(&self, number: Option<u64>) -> Result<Header, Error> {
        match number {
            None => Ok(self.chain.current_header()),
            Some(number) => self
                .chain
                .header_by_number(number)
                .ok_or(Error::UnknownBlock),
        }
    }
}
