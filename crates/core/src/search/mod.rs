/// Metadata filter evaluation: equality filters and condition clauses.
pub mod filter;
/// Hybrid merge strategies and the graph-query collaborator interface.
pub mod hybrid;
/// Query and result types.
pub mod types;

pub use hybrid::{GraphMatch, GraphQuery, MergeStrategy};
pub use types::{HybridQuery, HybridSearchResult, ResultSource, SearchQuery, SearchResult};
