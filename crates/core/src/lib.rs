//! # ruvector-core
//!
//! Embeddable in-memory vector store built on an HNSW approximate nearest
//! neighbor index, with metadata filtering, hybrid merging of external
//! graph-query matches, bulk loading and mutation events.
//!
//! All operations are synchronous. A [`VectorStore`] serializes mutations
//! behind a single write lock and lets searches share a read lock.

/// Global configuration constants and the serde-driven store configuration.
pub mod config;
/// Core entry types: `VectorEntry` and `Metadata`.
pub mod document;
/// Error type and `Result` alias.
pub mod error;
/// Filter types used by search queries.
pub mod filter_types;
/// HNSW approximate nearest neighbor index: graph structure, search, insertion, deletion, and distance metrics.
pub mod hnsw;
/// Search primitives: query and result types, metadata filtering, and hybrid merging.
pub mod search;
/// Storage layer: the store facade, batch loading, stats, and events.
pub mod storage;

pub use config::{CacheConfig, IndexConfig, RuVectorConfig};
pub use document::{validate_id, Metadata, VectorEntry};
pub use error::{Result, RuVectorError};
pub use filter_types::{FilterClause, FilterCondition, FilterOperator};
pub use hnsw::{DistanceMetric, LevelGenerator, LevelSource};
pub use search::{
    GraphMatch, GraphQuery, HybridQuery, HybridSearchResult, MergeStrategy, ResultSource,
    SearchQuery, SearchResult,
};
pub use storage::{
    BatchInsert, BatchInsertResult, BatchProgress, DuplicatePolicy, EventKind, ListenerId,
    StoreEvent, StoreStats, VectorStore,
};
