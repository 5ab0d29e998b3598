//! Named query kinds a backend may or may not implement.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A query kind a backend may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Fork information for a given state.
    Fork,
    /// Chain configuration (`/eth/v1/config/spec`).
    Spec,
    /// Genesis time, validators root and fork version.
    Genesis,
    /// Node software version string.
    NodeVersion,
    /// Node synchronization state.
    NodeSyncing,
}

impl Capability {
    /// Number of known capabilities.
    pub const COUNT: usize = 5;

    /// Every capability known to the registry, in probe order.
    pub const ALL: [Capability; Self::COUNT] =
        [Self::Fork, Self::Spec, Self::Genesis, Self::NodeVersion, Self::NodeSyncing];

    /// Returns a static string representation for logs and metrics labels.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fork => "fork",
            Self::Spec => "spec",
            Self::Genesis => "genesis",
            Self::NodeVersion => "node_version",
            Self::NodeSyncing => "node_syncing",
        }
    }

    /// Returns the single-member set for this capability.
    #[must_use]
    pub fn flag(self) -> CapabilitySet {
        match self {
            Self::Fork => CapabilitySet::FORK,
            Self::Spec => CapabilitySet::SPEC,
            Self::Genesis => CapabilitySet::GENESIS,
            Self::NodeVersion => CapabilitySet::NODE_VERSION,
            Self::NodeSyncing => CapabilitySet::NODE_SYNCING,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown capability name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown capability: {0}")]
pub struct UnknownCapability(pub String);

impl FromStr for Capability {
    type Err = UnknownCapability;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|capability| capability.as_str() == s)
            .ok_or_else(|| UnknownCapability(s.to_string()))
    }
}

bitflags! {
    /// Set of capabilities declared by a backend.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CapabilitySet: u8 {
        const FORK = 1 << 0;
        const SPEC = 1 << 1;
        const GENESIS = 1 << 2;
        const NODE_VERSION = 1 << 3;
        const NODE_SYNCING = 1 << 4;
    }
}

impl CapabilitySet {
    /// Returns `true` if the set contains `capability`.
    #[must_use]
    pub fn supports(&self, capability: Capability) -> bool {
        self.contains(capability.flag())
    }

    /// Iterates the capabilities in the set in [`Capability::ALL`] order.
    pub fn capabilities(self) -> impl Iterator<Item = Capability> {
        Capability::ALL.into_iter().filter(move |capability| self.supports(*capability))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), |set, capability| set | capability.flag())
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.capabilities().map(|c| c.as_str()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}
