//! Aggregate statistics derived from the graph on demand.

use crate::hnsw::HnswGraph;
use serde::Serialize;
use std::time::SystemTime;

pub const INDEX_TYPE: &str = "hnsw";

/// Snapshot returned by `VectorStore::get_stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_vectors: usize,
    pub dimensions: usize,
    pub index_type: &'static str,
    /// Estimated heap usage in bytes.
    pub memory_usage: usize,
    /// Time of the last mutation, `None` if the store was never mutated.
    pub last_updated: Option<SystemTime>,
    pub index_stats: IndexStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    /// Number of populated levels: `max_level + 1`, or 0 when empty.
    pub levels: usize,
    /// `level_distribution[l]` is the number of nodes whose top level is `l`.
    pub level_distribution: Vec<usize>,
    pub entry_point: Option<String>,
    /// Mean level-0 degree.
    pub avg_connections: f64,
    pub max_level: usize,
}

impl StoreStats {
    pub(crate) fn collect(graph: &HnswGraph, last_updated: Option<SystemTime>) -> Self {
        let levels = if graph.is_empty() {
            0
        } else {
            graph.max_level() + 1
        };
        Self {
            total_vectors: graph.len(),
            dimensions: graph.dimensions(),
            index_type: INDEX_TYPE,
            memory_usage: graph.estimate_memory_bytes(),
            last_updated,
            index_stats: IndexStats {
                levels,
                level_distribution: graph.level_distribution(),
                entry_point: graph.entry_point_id().map(str::to_string),
                avg_connections: graph.avg_connections(),
                max_level: graph.max_level(),
            },
        }
    }
}
