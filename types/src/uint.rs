use std::fmt;

use datasize::DataSize;
use serde::{
    de::{Deserialize, Deserializer, Error as SerdeError, Visitor},
    ser::{Serialize, Serializer},
};
use uint::construct_uint;

construct_uint! {
    /// 256-bit unsigned integer, used for stakes and reward amounts
    /// denominated in the chain's smallest unit (10^18 per token).
    pub struct U256(4);
}

impl DataSize for U256 {
    const IS_DYNAMIC: bool = false;
    const STATIC_HEAP_SIZE: usize = 0;

    fn estimate_heap_size(&self) -> usize {
        0
    }
}

// Amounts serialize as decimal strings so that JSON consumers are not
// exposed to numbers beyond 2^53.
impl Serialize for U256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for U256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct U256Visitor;

        impl<'de> Visitor<'de> for U256Visitor {
            type Value = U256;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a decimal string encoding a 256-bit unsigned integer")
            }

            fn visit_str<E: SerdeError>(self, value: &str) -> Result<U256, E> {
                U256::from_dec_str(value).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(U256Visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_decimal_string() {
        let amount = U256::from(250u64) * U256::exp10(18);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"250000000000000000000\"");
        let round_tripped: U256 = serde_json::from_str(&json).unwrap();
        assert_eq!(amount, round_tripped);
    }

    #[test]
    fn rejects_non_decimal_input() {
        assert!(serde_json::from_str::<U256>("\"0x10\"").is_err());
    }

    #[test]
    fn division_truncates() {
        let amount = U256::from(10u64);
        assert_eq!(amount / U256::from(3u64), U256::from(3u64));
    }
}
