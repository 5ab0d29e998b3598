//! Backend connections and their declared capabilities.
//!
//! - [`capability`]: named query kinds and the compact [`CapabilitySet`]
//! - [`node`]: the [`BeaconNode`] transport trait and the registered [`BackendHandle`]
//! - [`errors`]: per-backend failures with a transport/decode/unsupported classification
//! - [`http`]: reference [`HttpNode`] over the standard beacon REST API

pub mod capability;
pub mod errors;
pub mod http;
pub mod node;

pub use capability::{Capability, CapabilitySet, UnknownCapability};
pub use errors::{BackendError, FailureKind};
pub use http::{HttpNode, HttpNodeConfig};
pub use node::{BackendHandle, BeaconNode, RawSpec};
