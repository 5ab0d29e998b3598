//! Ordered decode rules turning raw configuration strings into [`SpecValue`]s.
//!
//! Backends disagree on how they encode the same configuration value, so each key/value pair
//! is run through [`DECODE_RULES`] in order. A rule matches on key or value shape and then
//! tries to decode; if decoding fails the pair falls through to the next rule. The last rule
//! keeps the raw string, so a single malformed entry never fails the whole payload.

use super::value::{ChainSpec, SpecValue};
use crate::{
    backend::RawSpec,
    types::{DomainType, Version},
    utils::hex::{left_aligned, parse_hex_bytes},
};
use chrono::DateTime;
use std::time::Duration;
use tracing::debug;

/// One step of the decode pipeline.
pub struct DecodeRule {
    pub name: &'static str,
    matches: fn(key: &str, value: &str) -> bool,
    decode: fn(value: &str) -> Option<SpecValue>,
}

impl DecodeRule {
    /// Returns the decoded value if this rule matches and decoding succeeds.
    #[must_use]
    pub fn apply(&self, key: &str, value: &str) -> Option<SpecValue> {
        if (self.matches)(key, value) {
            (self.decode)(value)
        } else {
            None
        }
    }
}

/// Decode rules in priority order; the first rule that produces a value wins.
pub const DECODE_RULES: &[DecodeRule] = &[
    DecodeRule {
        name: "domain",
        matches: |key, _| key.starts_with("DOMAIN_"),
        decode: |value| {
            parse_hex_bytes(value).map(|bytes| SpecValue::Domain(DomainType(left_aligned(&bytes))))
        },
    },
    DecodeRule {
        name: "fork_version",
        matches: |key, _| key.ends_with("_FORK_VERSION"),
        decode: |value| {
            parse_hex_bytes(value).map(|bytes| SpecValue::Version(Version(left_aligned(&bytes))))
        },
    },
    DecodeRule {
        name: "hex_bytes",
        matches: |_, value| value.starts_with("0x"),
        decode: |value| parse_hex_bytes(value).map(SpecValue::Bytes),
    },
    DecodeRule {
        name: "time",
        matches: |key, _| key.ends_with("_TIME"),
        // Seconds beyond chrono's range have no time point and fall through to `uint`.
        decode: |value| {
            let seconds = value.parse::<i64>().ok().filter(|s| *s != 0)?;
            DateTime::from_timestamp(seconds, 0).map(SpecValue::Time)
        },
    },
    DecodeRule {
        name: "duration",
        matches: |key, _| key.starts_with("SECONDS_PER_") || key == "GENESIS_DELAY",
        decode: |value| {
            parse_nonzero_u64(value).map(|secs| SpecValue::Duration(Duration::from_secs(secs)))
        },
    },
    DecodeRule {
        name: "zero",
        matches: |_, value| value == "0",
        decode: |_| Some(SpecValue::Uint(0)),
    },
    DecodeRule {
        name: "uint",
        matches: |_, _| true,
        decode: |value| parse_nonzero_u64(value).map(SpecValue::Uint),
    },
    DecodeRule {
        name: "string",
        matches: |_, _| true,
        decode: |value| Some(SpecValue::String(value.to_string())),
    },
];

/// Parses a plain base-10 unsigned integer, `None` for zero or anything with a sign.
fn parse_nonzero_u64(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse::<u64>().ok().filter(|v| *v != 0)
}

/// Constants some backends omit, inserted only when absent.
fn patches() -> [(&'static str, SpecValue); 5] {
    [
        ("DOMAIN_CONTRIBUTION_AND_PROOF", SpecValue::Domain(DomainType([0x09, 0x00, 0x00, 0x00]))),
        ("DOMAIN_SYNC_COMMITTEE", SpecValue::Domain(DomainType([0x07, 0x00, 0x00, 0x00]))),
        (
            "DOMAIN_SYNC_COMMITTEE_SELECTION_PROOF",
            SpecValue::Domain(DomainType([0x08, 0x00, 0x00, 0x00])),
        ),
        ("SYNC_COMMITTEE_SUBNET_COUNT", SpecValue::Uint(4)),
        ("TARGET_AGGREGATORS_PER_SYNC_SUBCOMMITTEE", SpecValue::Uint(16)),
    ]
}

/// Decodes a single raw pair.
#[must_use]
pub fn decode_value(key: &str, value: &str) -> SpecValue {
    DECODE_RULES
        .iter()
        .find_map(|rule| rule.apply(key, value))
        .unwrap_or_else(|| SpecValue::String(value.to_string()))
}

/// Decodes a raw configuration payload and fills in missing well-known constants.
#[must_use]
pub fn normalize(raw: &RawSpec) -> ChainSpec {
    let mut spec: ChainSpec =
        raw.iter().map(|(key, value)| (key.clone(), decode_value(key, value))).collect();

    for (key, value) in patches() {
        if !spec.contains_key(key) {
            debug!(key, "patching missing chain configuration constant");
            spec.insert(key, value);
        }
    }

    spec
}
