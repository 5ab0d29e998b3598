//! Utility functions shared across modules.
//!
//! - [`hex`]: "0x"-prefixed hex parsing and the serde adapters used by the beacon API types.

pub mod hex;

pub use self::hex::{left_aligned, parse_hex_array, parse_hex_bytes, strip_0x, to_hex};
