//! Storage layer: the vector store facade and its supporting pieces.
//!
//! Data lives in-memory in a single [`VectorStore`]; there is no durability
//! layer.

/// Bulk loading with duplicate policies and progress reporting.
pub mod batch;
/// Mutation events and listener registration.
pub mod events;
/// On-demand aggregate statistics.
pub mod stats;
/// The thread-safe store handle.
pub mod store;

pub use batch::{BatchError, BatchInsert, BatchInsertResult, BatchProgress, DuplicatePolicy};
pub use events::{EventKind, ListenerId, StoreEvent};
pub use stats::{IndexStats, StoreStats};
pub use store::VectorStore;
