//! Beacon API domain types returned by the typed client.
//!
//! Fixed-length byte values serialize as "0x"-prefixed hex, integers as decimal strings,
//! matching the encoding used on the wire by every beacon node implementation.

use crate::utils::hex::{parse_hex_array, quoted_u64, serde_array, to_hex};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// 4-byte domain type used to namespace signed messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DomainType(#[serde(with = "serde_array")] pub [u8; 4]);

/// 4-byte fork version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Version(#[serde(with = "serde_array")] pub [u8; 4]);

/// 32-byte SSZ hash tree root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Root(#[serde(with = "serde_array")] pub [u8; 32]);

impl fmt::Display for DomainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_hex(&self.0))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_hex(&self.0))
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_hex(&self.0))
    }
}

/// Fork information for a beacon state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fork {
    pub previous_version: Version,
    pub current_version: Version,
    #[serde(with = "quoted_u64")]
    pub epoch: u64,
}

/// Genesis information of the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    #[serde(with = "unix_seconds")]
    pub genesis_time: DateTime<Utc>,
    pub genesis_validators_root: Root,
    pub genesis_fork_version: Version,
}

/// Synchronization state reported by a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    #[serde(with = "quoted_u64")]
    pub head_slot: u64,
    #[serde(with = "quoted_u64")]
    pub sync_distance: u64,
    pub is_syncing: bool,
    /// Older nodes do not report optimistic status.
    #[serde(default)]
    pub is_optimistic: bool,
}

/// Identifies the beacon state a query applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateId {
    Head,
    Genesis,
    Finalized,
    Justified,
    Slot(u64),
    Root(Root),
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Head => f.write_str("head"),
            Self::Genesis => f.write_str("genesis"),
            Self::Finalized => f.write_str("finalized"),
            Self::Justified => f.write_str("justified"),
            Self::Slot(slot) => write!(f, "{slot}"),
            Self::Root(root) => write!(f, "{root}"),
        }
    }
}

/// Error returned when a state identifier cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid state identifier: {0}")]
pub struct InvalidStateId(pub String);

impl FromStr for StateId {
    type Err = InvalidStateId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "head" => Ok(Self::Head),
            "genesis" => Ok(Self::Genesis),
            "finalized" => Ok(Self::Finalized),
            "justified" => Ok(Self::Justified),
            _ if s.starts_with("0x") => parse_hex_array::<32>(s)
                .map(|bytes| Self::Root(Root(bytes)))
                .ok_or_else(|| InvalidStateId(s.to_string())),
            _ => s.parse().map(Self::Slot).map_err(|_| InvalidStateId(s.to_string())),
        }
    }
}

/// Serde adapter for timestamps the beacon API transmits as quoted Unix seconds.
mod unix_seconds {
    use super::{DateTime, Deserialize, Deserializer, Serializer, Utc};
    use serde::de::Error;

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.timestamp().to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let seconds: i64 =
            raw.parse().map_err(|e| D::Error::custom(format!("invalid timestamp {raw}: {e}")))?;
        DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {seconds}")))
    }
}
