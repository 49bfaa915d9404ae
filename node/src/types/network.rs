use datasize::DataSize;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use meridian_types::Address;

/// The well-known governance and registry contract addresses baked
/// into a network profile.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct NetworkContracts {
    /// The masternode voting contract: candidate enumeration and
    /// stake queries.
    pub masternode_voting: Address,
    /// The block signer contract: confirming transactions are
    /// addressed to it.
    pub block_signer: Address,
    /// The randomize contract holding each candidate's committed
    /// secret.
    pub randomize: Address,
    /// The relayer registry.
    pub relayer_registry: Address,
    /// The lending registry.
    pub lending_registry: Address,
}

fn well_known(hex: &str) -> Address {
    Address::from_hex(hex).expect("well-known address")
}

static PRODUCTION_CONTRACTS: Lazy<NetworkContracts> = Lazy::new(|| NetworkContracts {
    masternode_voting: well_known("0x0000000000000000000000000000000000000088"),
    block_signer: well_known("0x0000000000000000000000000000000000000089"),
    randomize: well_known("0x0000000000000000000000000000000000000090"),
    relayer_registry: well_known("0x16c63b79f9c8784168103c0b74e6a59ec2de4a02"),
    lending_registry: well_known("0x7d761afd7ff65a79e4173897594a194e3c506e57"),
});

static TEST_CONTRACTS: Lazy<NetworkContracts> = Lazy::new(|| NetworkContracts {
    masternode_voting: well_known("0x0000000000000000000000000000000000000088"),
    block_signer: well_known("0x0000000000000000000000000000000000000089"),
    randomize: well_known("0x0000000000000000000000000000000000000090"),
    relayer_registry: well_known("0xa1996f69f47ba14cb7f661010a7c31974277958c"),
    lending_registry: well_known("0x4d7ea2ce4f2bcb487bb5f9aa7c29b10798d4c479"),
});

/// Selects which set of well-known contract addresses the node uses.
/// This is a static configuration switch, not a consensus rule.
#[derive(Clone, Copy, DataSize, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum NetworkProfile {
    /// The production network.
    Production,
    /// The public test network.
    Test,
}

impl NetworkProfile {
    /// Returns the profile's contract addresses.
    pub fn contracts(&self) -> &'static NetworkContracts {
        match self {
            NetworkProfile::Production => &PRODUCTION_CONTRACTS,
            NetworkProfile::Test => &TEST_CONTRACTS,
        }
    }
}

/// Network identity and well-known contract addresses, as reported by
/// the consensus query API.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct NetworkInformation {
    /// The chain's network id.
    pub network_id: u64,
    /// See [`NetworkContracts::masternode_voting`].
    pub masternode_voting: Address,
    /// See [`NetworkContracts::block_signer`].
    pub block_signer: Address,
    /// See [`NetworkContracts::randomize`].
    pub randomize: Address,
    /// See [`NetworkContracts::relayer_registry`].
    pub relayer_registry: Address,
    /// See [`NetworkContracts::lending_registry`].
    pub lending_registry: Address,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_share_system_contracts_but_not_registries() {
        let production = NetworkProfile::Production.contracts();
        let test = NetworkProfile::Test.contracts();
        assert_eq!(production.masternode_voting, test.masternode_voting);
        assert_eq!(production.block_signer, test.block_signer);
        assert_ne!(production.relayer_registry, test.relayer_registry);
        assert_ne!(production.lending_registry, test.lending_registry);
    }
}
