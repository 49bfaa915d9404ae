use std::fmt::{self, Debug, Display, Formatter};

use datasize::DataSize;
use hex_fmt::HexFmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when parsing an [`Address`] from a hex string.
#[derive(Debug, Error)]
pub enum AddressParseError {
    /// The decoded byte string was not exactly [`Address::LENGTH`] bytes.
    #[error("address must decode to exactly {} bytes", Address::LENGTH)]
    WrongLength,
    /// The input was not valid hex.
    #[error("invalid hex encoding: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// A 20-byte account identifier; masternodes, stake-backers and
/// governance contracts are all addressed this way.
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
)]
pub struct Address([u8; Address::LENGTH]);

impl Address {
    /// The number of bytes in an address.
    pub const LENGTH: usize = 20;

    /// Constructs an address from raw bytes.
    pub const fn new(bytes: [u8; Address::LENGTH]) -> Self {
        Address(bytes)
    }

    /// The all-zeroes address, used as a "not set" sentinel by
    /// configuration and filtered out of candidate lists.
    pub const fn zero() -> Self {
        Address([0; Address::LENGTH])
    }

    /// Returns `true` if this is the all-zeroes address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0; Address::LENGTH]
    }

    /// Returns the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; Address::LENGTH] {
        &self.0
    }

    /// Parses an address from a hex string, with or without a leading
    /// `0x`.
    pub fn from_hex<T: AsRef<[u8]>>(input: T) -> Result<Self, AddressParseError> {
        let input = input.as_ref();
        let stripped = input.strip_prefix(b"0x").unwrap_or(input);
        let bytes = hex::decode(stripped)?;
        let array = <[u8; Address::LENGTH]>::try_from(bytes.as_slice())
            .map_err(|_| AddressParseError::WrongLength)?;
        Ok(Address(array))
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; Address::LENGTH]> for Address {
    fn from(bytes: [u8; Address::LENGTH]) -> Self {
        Address(bytes)
    }
}

impl Display for Address {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "0x{}", HexFmt(&self.0))
    }
}

impl Debug for Address {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "Address(0x{})", HexFmt(&self.0))
    }
}

/// Packs an address list into the byte representation carried by the
/// `validators` and `penalties` header fields: the 20-byte addresses
/// concatenated in list order.
pub fn pack_address_list(addresses: &[Address]) -> Vec<u8> {
    let mut packed = Vec::with_capacity(addresses.len() * Address::LENGTH);
    for address in addresses {
        packed.extend_from_slice(address.as_bytes());
    }
    packed
}

/// Decodes a packed address list. Trailing bytes that do not form a
/// whole address are ignored.
pub fn unpack_address_list(bytes: &[u8]) -> Vec<Address> {
    bytes
        .chunks_exact(Address::LENGTH)
        .map(|chunk| {
            let mut array = [0; Address::LENGTH];
            array.copy_from_slice(chunk);
            Address(array)
        })
        .collect()
}
