//! Query and result types for vector and hybrid search.

use crate::document::Metadata;
use crate::filter_types::FilterClause;
use crate::search::hybrid::MergeStrategy;
use serde::{Deserialize, Serialize};

/// A k-nearest-neighbor query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub vector: Vec<f32>,
    pub k: usize,
    /// Equality filter: every key must be present in the entry's metadata with an equal value.
    #[serde(default)]
    pub filter: Option<Metadata>,
    /// Structured conditions, ANDed with `filter`.
    #[serde(default)]
    pub conditions: Option<FilterClause>,
    /// Results scoring below this threshold are dropped.
    #[serde(default)]
    pub min_score: Option<f32>,
    /// Attach stored vectors to the results.
    #[serde(default)]
    pub include_vectors: bool,
}

impl SearchQuery {
    pub fn new(vector: Vec<f32>, k: usize) -> Self {
        Self {
            vector,
            k,
            filter: None,
            conditions: None,
            min_score: None,
            include_vectors: false,
        }
    }

    pub fn with_filter(mut self, filter: Metadata) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_conditions(mut self, conditions: FilterClause) -> Self {
        self.conditions = Some(conditions);
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = Some(min_score);
        self
    }

    pub fn with_vectors(mut self) -> Self {
        self.include_vectors = true;
        self
    }
}

/// A single search hit.
///
/// `score` lies in `[0, 1]`, higher is more similar; `distance` is the raw
/// metric distance the score was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub score: f32,
    pub distance: f32,
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}

/// A vector query optionally enriched by an external graph query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HybridQuery {
    pub vector: Vec<f32>,
    pub k: usize,
    #[serde(default)]
    pub filter: Option<Metadata>,
    #[serde(default)]
    pub conditions: Option<FilterClause>,
    #[serde(default)]
    pub min_score: Option<f32>,
    /// Criteria handed to the graph-query collaborator, if one is supplied.
    #[serde(default)]
    pub graph_criteria: Option<serde_json::Value>,
    #[serde(default)]
    pub merge: MergeStrategy,
    #[serde(default)]
    pub include_vectors: bool,
}

impl HybridQuery {
    pub fn new(vector: Vec<f32>, k: usize) -> Self {
        Self {
            vector,
            k,
            filter: None,
            conditions: None,
            min_score: None,
            graph_criteria: None,
            merge: MergeStrategy::default(),
            include_vectors: false,
        }
    }

    pub fn with_graph_criteria(mut self, criteria: serde_json::Value) -> Self {
        self.graph_criteria = Some(criteria);
        self
    }

    pub fn with_merge(mut self, merge: MergeStrategy) -> Self {
        self.merge = merge;
        self
    }

    pub fn with_filter(mut self, filter: Metadata) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = Some(min_score);
        self
    }

    /// The vector-search half of this query.
    pub(crate) fn vector_query(&self) -> SearchQuery {
        SearchQuery {
            vector: self.vector.clone(),
            k: self.k,
            filter: self.filter.clone(),
            conditions: self.conditions.clone(),
            min_score: None,
            include_vectors: self.include_vectors,
        }
    }
}

/// Where a hybrid result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Vector,
    Graph,
    Both,
}

/// A hybrid search hit. `distance` is `None` for graph-only matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HybridSearchResult {
    pub id: String,
    pub score: f32,
    pub distance: Option<f32>,
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    pub source: ResultSource,
}

impl From<SearchResult> for HybridSearchResult {
    fn from(r: SearchResult) -> Self {
        Self {
            id: r.id,
            score: r.score,
            distance: Some(r.distance),
            metadata: r.metadata,
            vector: r.vector,
            source: ResultSource::Vector,
        }
    }
}
