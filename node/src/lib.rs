//! # Meridian blockchain node
//!
//! Core library for the Meridian permissioned-masternode chain. The
//! heart of the crate is the PoSV (Proof-of-Stake-Voting) consensus
//! component, which decides for every block who was authorized to
//! produce it, who must co-sign it, which masternodes are excluded
//! from the active set for under-performing, and how the block reward
//! is split among producers and their stake-backers.
//!
//! Networking, storage, transaction execution and RPC transports are
//! wired up by the surrounding node application and reach this crate
//! only through the interfaces in
//! [`components::consensus::traits`](components/consensus/traits/index.html).

#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_qualifications
)]

pub mod components;
pub mod types;
pub(crate) mod utils;

pub use components::consensus::{
    Api, Config as PosvConfig, Error as PosvError, Masternode, Posv, RewardRecord,
    SigningCoordinator, Snapshot,
};
