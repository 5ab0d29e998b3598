use crate::types::{DomainType, Version};
use chrono::{DateTime, Utc};
use std::{collections::BTreeMap, time::Duration};

/// A chain configuration value decoded to its natural type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecValue {
    Domain(DomainType),
    Version(Version),
    Bytes(Vec<u8>),
    Time(DateTime<Utc>),
    Duration(Duration),
    Uint(u64),
    String(String),
}

impl SpecValue {
    /// Returns the variant name for logs and error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Domain(_) => "domain",
            Self::Version(_) => "version",
            Self::Bytes(_) => "bytes",
            Self::Time(_) => "time",
            Self::Duration(_) => "duration",
            Self::Uint(_) => "uint",
            Self::String(_) => "string",
        }
    }
}

/// Normalized chain configuration, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainSpec {
    values: BTreeMap<String, SpecValue>,
}

impl ChainSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: SpecValue) -> Option<SpecValue> {
        self.values.insert(key.into(), value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SpecValue> {
        self.values.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SpecValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    #[must_use]
    pub fn domain(&self, key: &str) -> Option<DomainType> {
        match self.get(key)? {
            SpecValue::Domain(domain) => Some(*domain),
            _ => None,
        }
    }

    #[must_use]
    pub fn version(&self, key: &str) -> Option<Version> {
        match self.get(key)? {
            SpecValue::Version(version) => Some(*version),
            _ => None,
        }
    }

    #[must_use]
    pub fn bytes(&self, key: &str) -> Option<&[u8]> {
        match self.get(key)? {
            SpecValue::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    #[must_use]
    pub fn time(&self, key: &str) -> Option<DateTime<Utc>> {
        match self.get(key)? {
            SpecValue::Time(time) => Some(*time),
            _ => None,
        }
    }

    #[must_use]
    pub fn duration(&self, key: &str) -> Option<Duration> {
        match self.get(key)? {
            SpecValue::Duration(duration) => Some(*duration),
            _ => None,
        }
    }

    /// Zero-valued duration keys such as `GENESIS_DELAY = "0"` decode as `Uint(0)`.
    #[must_use]
    pub fn uint(&self, key: &str) -> Option<u64> {
        match self.get(key)? {
            SpecValue::Uint(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn string(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            SpecValue::String(value) => Some(value),
            _ => None,
        }
    }
}

impl FromIterator<(String, SpecValue)> for ChainSpec {
    fn from_iter<I: IntoIterator<Item = (String, SpecValue)>>(iter: I) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}
