//! Chain configuration normalization.
//!
//! Turns the flat string map a backend returns from its configuration endpoint into a
//! [`ChainSpec`] of typed [`SpecValue`]s.

pub mod rules;
pub mod value;

pub use rules::{decode_value, normalize, DecodeRule, DECODE_RULES};
pub use value::{ChainSpec, SpecValue};
