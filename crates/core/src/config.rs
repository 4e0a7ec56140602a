//! Configuration for ruvector-core.
//!
//! Tuning defaults and input limits are compile-time constants. Runtime
//! configuration is a [`RuVectorConfig`] supplied by the caller, usually parsed
//! from a JSON document with camelCase keys:
//!
//! ```json
//! { "index": { "dimensions": 384, "distanceMetric": "cosine", "maxConnections": 16 } }
//! ```

use crate::error::{Result, RuVectorError};
use crate::hnsw::distance::DistanceMetric;
use serde::{Deserialize, Serialize};

/// Default number of neighbors per node per level (`M`).
///
/// Higher values improve recall but increase memory and build time.
/// Typical range: 8–64. Default: 16.
pub const DEFAULT_MAX_CONNECTIONS: usize = 16;

/// Default candidate list size during insertion.
///
/// Higher values produce a better graph but slow down inserts.
pub const DEFAULT_EF_CONSTRUCTION: usize = 200;

/// Default candidate list size during search.
///
/// Higher values improve recall at the cost of latency.
pub const DEFAULT_EF_SEARCH: usize = 50;

/// Upper bound on a drawn level. Levels are capped at `MAX_LAYERS - 1`.
pub const MAX_LAYERS: usize = 16;

/// Maximum allowed vector dimension.
pub const MAX_DIMENSION: usize = 4096;

/// Maximum number of results (`k`) per search. Larger requests are clamped.
pub const MAX_K: usize = 10_000;

/// Maximum length of a vector id in bytes (enforced by [`validate_id`](crate::document::validate_id)).
pub const MAX_ID_LEN: usize = 256;

/// Number of entries between two progress reports during a batch insert.
pub const BATCH_PROGRESS_CHUNK: usize = 100;

/// Reciprocal Rank Fusion constant `k`, used as `1 / (k + rank)`.
///
/// Standard value is 60.0 (from the original RRF paper).
pub const RRF_K: f32 = 60.0;

/// Default cache capacity of the pass-through cache block.
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 1_000;

/// Default cache TTL of the pass-through cache block.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Top-level store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuVectorConfig {
    pub index: IndexConfig,
    /// Carried through untouched; the index never reads it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheConfig>,
}

/// HNSW index parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexConfig {
    /// Length every stored and query vector must have.
    pub dimensions: usize,
    #[serde(default)]
    pub distance_metric: DistanceMetric,
    /// Target neighbors per node per level (`M`).
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Candidate list size used while inserting.
    #[serde(default = "default_ef_construction")]
    pub ef_construction: usize,
    /// Candidate list size used while searching.
    #[serde(default = "default_ef_search")]
    pub ef_search: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_max_connections() -> usize {
    DEFAULT_MAX_CONNECTIONS
}

fn default_ef_construction() -> usize {
    DEFAULT_EF_CONSTRUCTION
}

fn default_ef_search() -> usize {
    DEFAULT_EF_SEARCH
}

fn default_cache_max_entries() -> usize {
    DEFAULT_CACHE_MAX_ENTRIES
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

impl IndexConfig {
    /// Index parameters with defaults for everything but the dimension.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            distance_metric: DistanceMetric::default(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            ef_construction: DEFAULT_EF_CONSTRUCTION,
            ef_search: DEFAULT_EF_SEARCH,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl RuVectorConfig {
    /// Creates a configuration with default index parameters and no cache block.
    pub fn new(dimensions: usize) -> Self {
        Self {
            index: IndexConfig::new(dimensions),
            cache: None,
        }
    }

    /// Sets the distance metric.
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.index.distance_metric = metric;
        self
    }

    /// Sets `M`, `efConstruction` and `efSearch` in one call.
    pub fn with_hnsw_params(mut self, m: usize, ef_construction: usize, ef_search: usize) -> Self {
        self.index.max_connections = m;
        self.index.ef_construction = ef_construction;
        self.index.ef_search = ef_search;
        self
    }

    /// Parses a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RuVectorError::InvalidConfig(e.to_string()))
    }

    /// Checks that the index parameters are usable.
    pub fn validate(&self) -> Result<()> {
        let index = &self.index;
        if index.dimensions == 0 {
            return Err(RuVectorError::InvalidConfig(
                "dimensions must be greater than 0".into(),
            ));
        }
        if index.dimensions > MAX_DIMENSION {
            return Err(RuVectorError::InvalidConfig(format!(
                "dimensions {} exceeds maximum {}",
                index.dimensions, MAX_DIMENSION
            )));
        }
        // ln(M) must be positive for the level multiplier 1/ln(M)
        if index.max_connections < 2 {
            return Err(RuVectorError::InvalidConfig(format!(
                "maxConnections must be at least 2, got {}",
                index.max_connections
            )));
        }
        if index.ef_construction == 0 {
            return Err(RuVectorError::InvalidConfig(
                "efConstruction must be greater than 0".into(),
            ));
        }
        if index.ef_search == 0 {
            return Err(RuVectorError::InvalidConfig(
                "efSearch must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
