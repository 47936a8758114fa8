use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::Geometry;

/// A cache configuration with multiple layers, checked in order from first to last
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayeredCacheConfig {
    pub caches: Vec<CacheConfig>,
}

impl LayeredCacheConfig {
    /// Parses a JSON configuration
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Opens and parses a JSON configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

/// A configuration for a single cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub name: String,
    pub size: u64,
    pub line_size: u64,
    pub kind: CacheKindConfig,
    #[serde(default)]
    pub replacement_policy: ReplacementPolicyConfig,
}

impl CacheConfig {
    /// Validates the declared sizes and derives the geometry of the cache
    pub fn geometry(&self) -> Result<Geometry> {
        Geometry::calculate(&self.name, self.size, self.line_size, self.kind)
    }
}

/// The kind of cache - direct, full, 2way, 4way, or 8way
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheKindConfig {
    #[serde(alias = "direct")]
    Direct,
    #[serde(alias = "full")]
    Full,
    #[serde(alias = "2way")]
    TwoWay,
    #[serde(alias = "4way")]
    FourWay,
    #[serde(alias = "8way")]
    EightWay,
}

impl CacheKindConfig {
    /// Lines per set for set-based kinds. Fully associative caches have a single set holding every
    /// line, so there is no fixed value
    pub fn ways(&self) -> Option<u64> {
        match self {
            CacheKindConfig::Direct => Some(1),
            CacheKindConfig::Full => None,
            CacheKindConfig::TwoWay => Some(2),
            CacheKindConfig::FourWay => Some(4),
            CacheKindConfig::EightWay => Some(8),
        }
    }
}

/// The replacement policy, if applicable - round robin, lru, or lfu. Defaults to round robin.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplacementPolicyConfig {
    #[default]
    #[serde(alias = "rr")]
    RoundRobin,
    #[serde(alias = "lru")]
    LeastRecentlyUsed,
    #[serde(alias = "lfu")]
    LeastFrequentlyUsed,
}
