//! Components the node is composed of.
//!
//! Each component owns its own state and exposes a small, synchronous
//! surface to the rest of the node; collaborators are reached through
//! trait objects injected at construction time rather than through
//! callbacks assigned after the fact.

pub mod consensus;
