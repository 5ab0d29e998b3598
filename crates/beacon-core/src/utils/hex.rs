//! Hex parsing helpers shared by the domain types and the spec normalizer.

/// Strips an optional "0x" prefix.
#[inline]
#[must_use]
pub fn strip_0x(value: &str) -> &str {
    value.strip_prefix("0x").unwrap_or(value)
}

/// Parses a hex string to bytes.
///
/// Accepts strings with or without "0x" prefix. Returns `None` if invalid hex or odd length.
#[must_use]
pub fn parse_hex_bytes(value: &str) -> Option<Vec<u8>> {
    hex::decode(strip_0x(value)).ok()
}

/// Parses a hex string to a fixed-size byte array of exactly `N` bytes.
///
/// Returns `None` if the decoded length differs from `N`.
#[must_use]
pub fn parse_hex_array<const N: usize>(value: &str) -> Option<[u8; N]> {
    let mut array = [0u8; N];
    hex::decode_to_slice(strip_0x(value), &mut array).ok()?;
    Some(array)
}

/// Copies `bytes` left-aligned into an `N`-byte array.
///
/// Shorter input is zero-padded on the right, longer input is truncated.
#[must_use]
pub fn left_aligned<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut array = [0u8; N];
    let len = bytes.len().min(N);
    array[..len].copy_from_slice(&bytes[..len]);
    array
}

/// Formats bytes as lowercase hex with a "0x" prefix.
#[must_use]
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Serde adapter for fixed-size byte arrays encoded as "0x"-prefixed hex strings.
pub mod serde_array {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S, const N: usize>(bytes: &[u8; N], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::to_hex(bytes))
    }

    pub fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        super::parse_hex_array::<N>(&value)
            .ok_or_else(|| D::Error::custom(format!("expected {N} hex-encoded bytes, got {value}")))
    }
}

/// Serde adapter for `u64` values the beacon API transmits as decimal strings.
pub mod quoted_u64 {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(|e| D::Error::custom(format!("invalid quoted integer {value}: {e}")))
    }
}
