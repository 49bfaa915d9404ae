use std::fmt::{self, Debug, Display, Formatter};

use datasize::DataSize;
use hex_fmt::HexFmt;
use serde::{Deserialize, Serialize};

/// Opaque seal bytes produced by the node's signing capability.
///
/// The signature scheme itself is outside this crate; consensus only
/// carries the bytes and hands them to the scheme for recovery.
#[derive(Clone, DataSize, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// Wraps raw signature bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Signature(bytes)
    }

    /// Returns the signature bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns `true` if no signature has been set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for Signature {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "{:10}", HexFmt(&self.0))
    }
}

impl Debug for Signature {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "Signature({})", HexFmt(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        assert!(Signature::default().is_empty());
        assert!(!Signature::new(vec![1, 2, 3]).is_empty());
    }
}
