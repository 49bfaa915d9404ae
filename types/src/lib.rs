//! Primitive types shared across the Meridian blockchain node.
//!
//! The crate deliberately contains no consensus logic: it defines the
//! account [`Address`], the [`Digest`] hash, the [`U256`] big unsigned
//! integer used for stakes and reward amounts, and the opaque
//! [`Signature`] seal bytes, together with the packed address-list
//! codec used by checkpoint headers.

#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_qualifications
)]

mod address;
mod digest;
mod signature;
mod uint;

pub use address::{pack_address_list, unpack_address_list, Address, AddressParseError};
pub use digest::Digest;
pub use signature::Signature;
pub use uint::U256;
