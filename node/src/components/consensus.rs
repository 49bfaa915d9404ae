//! The PoSV consensus component.
//!
//! Proof-of-Stake-Voting secures the chain with a fixed-size set of
//! staked masternodes. Every epoch (a fixed number of blocks) the set
//! is re-derived at a checkpoint block: an ordered validator list is
//! produced from the candidates' on-chain committed secrets, and
//! masternodes that under-performed in the previous epoch are
//! excluded. Each block is sealed by its producer ("M1") and
//! co-signed by a deterministically selected second validator ("M2");
//! producers additionally submit confirming transactions that feed
//! the penalty and reward computations.
//!
//! All hooks run synchronously inside the block-import or
//! block-sealing pipeline; the snapshot and block-signer caches
//! support concurrent reads from RPC queries.

mod api;
mod config;
mod error;
mod metrics;
mod penalty;
mod randomize;
mod reward;
mod signing;
mod snapshot;
pub mod traits;

use std::sync::{Arc, RwLock};

use datasize::DataSize;
use serde::{Deserialize, Serialize};
use tracing::debug;

use meridian_types::{Address, U256};

use crate::types::{Header, NetworkProfile};

pub use api::Api;
pub use config::Config;
pub use error::Error;
pub use reward::{RewardRecord, SignerReward};
pub use signing::SigningCoordinator;
pub use snapshot::Snapshot;

use metrics::Metrics;
use signing::BlockSignerCache;
use snapshot::SnapshotCache;
use traits::{ChainReader, GovernanceReader, SealRecovery, SignHash};

/// A masternode candidate: an address and the stake voted behind it.
#[derive(Clone, DataSize, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Masternode {
    /// The candidate address.
    pub address: Address,
    /// The stake backing the candidate.
    pub stake: U256,
}

/// The local signing identity, installed once staking starts.
struct LocalSigner {
    address: Address,
    capability: Arc<dyn SignHash>,
}

/// The PoSV consensus engine.
///
/// One instance lives for the lifetime of the node. It owns the
/// per-epoch snapshot cache and the block-signer cache; everything
/// else it needs (chain access, governance contract state, the
/// signature scheme) is injected through the traits in [`traits`].
pub struct Posv {
    config: Config,
    profile: NetworkProfile,
    governance: Arc<dyn GovernanceReader>,
    seal: Arc<dyn SealRecovery>,
    snapshots: SnapshotCache,
    block_signers: BlockSignerCache,
    local: RwLock<Option<LocalSigner>>,
    metrics: Metrics,
}

impl Posv {
    /// Constructs the engine.
    pub fn new(
        config: Config,
        profile: NetworkProfile,
        governance: Arc<dyn GovernanceReader>,
        seal: Arc<dyn SealRecovery>,
        registry: &prometheus::Registry,
    ) -> Result<Self, Error> {
        config.validate()?;
        Ok(Posv {
            config,
            profile,
            governance,
            seal,
            snapshots: SnapshotCache::default(),
            block_signers: BlockSignerCache::default(),
            local: RwLock::new(None),
            metrics: Metrics::new(registry)?,
        })
    }

    /// The protocol configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The network profile the engine was built for.
    pub fn profile(&self) -> NetworkProfile {
        self.profile
    }

    /// Installs the local signing identity. Until this is called the
    /// node imports blocks but never signs or confirms anything.
    pub fn authorize(&self, address: Address, capability: Arc<dyn SignHash>) {
        let mut local = self.local.write().expect("local signer lock poisoned");
        *local = Some(LocalSigner {
            address,
            capability,
        });
        debug!(%address, "local signing identity installed");
    }

    /// The locally configured signing address, if one is installed.
    pub fn local_address(&self) -> Option<Address> {
        self.local
            .read()
            .expect("local signer lock poisoned")
            .as_ref()
            .map(|signer| signer.address)
    }

    /// The local address together with its signing capability.
    fn local_signer(&self) -> Option<(Address, Arc<dyn SignHash>)> {
        self.local
            .read()
            .expect("local signer lock poisoned")
            .as_ref()
            .map(|signer| (signer.address, Arc::clone(&signer.capability)))
    }

    /// Recovers the producer ("M1") from a sealed header.
    pub fn producer(&self, header: &Header) -> Result<Address, Error> {
        Ok(self.seal.recover_producer(header)?)
    }

    /// Returns whether the locally configured address belongs to the
    /// masternode set at the chain head. Used before staking starts.
    pub fn validate_masternode(&self, chain: &dyn ChainReader) -> Result<bool, Error> {
        let address = self.local_address().ok_or(Error::MissingLocalAddress)?;
        let snapshot = self.snapshot(chain, &chain.current_header())?;
        Ok(snapshot.is_authorized(&address))
    }
}
