//! Hierarchical Navigable Small World (HNSW) approximate nearest neighbor index.
//!
//! Nodes live in an arena of `u32` slots; adjacency lists hold slots, one list
//! per level from 0 up to the node's assigned level. Neighbor relations are
//! kept symmetric by insertion, pruning and deletion alike, and every level
//! stays a single connected component. Levels are drawn from an injected
//! [`LevelSource`], so graphs are reproducible under a seed.

/// Reachability walks and reattachment that keep every level connected.
mod connectivity;
/// Distance metrics: cosine, euclidean, dot product, and manhattan.
pub mod distance;
/// Deletion with neighbor repair and entry-point re-election.
pub mod delete;
/// Node arena, index state, and structural validation.
pub mod graph;
/// Insertion with bidirectional linking and nearest-M pruning.
pub mod insert;
/// Seedable geometric level generator.
pub mod level;
/// Greedy descent, single-layer beam search, and multi-level KNN.
pub mod search;
/// Epoch-stamped visited set for graph traversal.
pub mod visited;

pub use distance::DistanceMetric;
pub use graph::{HnswGraph, Node};
pub use insert::InsertOutcome;
pub use level::{LevelGenerator, LevelSource};
