//! Chain-level data types shared by the node's components.

mod block;
mod network;
mod transaction;

pub use block::{Block, BlockHash, Header};
pub use network::{NetworkContracts, NetworkInformation, NetworkProfile};
pub use transaction::Transaction;
