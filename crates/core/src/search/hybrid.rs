//! Hybrid search merge strategies.
//!
//! Combines vector search results with matches from an external graph-query
//! collaborator into a single ranked list. Two strategies are available:
//! - **VectorFirst**: union by id; the vector-derived score wins on conflict
//! - **ReciprocalRank**: rank-based fusion, `score(d) = sum(1 / (RRF_K + rank_i(d)))`

use crate::config;
use crate::document::Metadata;
use crate::error::Result;
use crate::search::types::{HybridSearchResult, ResultSource, SearchResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A match returned by a graph-query collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMatch {
    pub id: String,
    /// Relevance in `[0, 1]`; values outside are clamped when merged.
    pub score: f32,
    #[serde(default)]
    pub metadata: Metadata,
}

impl GraphMatch {
    pub fn new(id: impl Into<String>, score: f32) -> Self {
        Self {
            id: id.into(),
            score,
            metadata: Metadata::new(),
        }
    }
}

/// External graph-query backend consulted by hybrid search.
///
/// Implemented for any `Fn(&Value) -> Result<Vec<GraphMatch>>` closure.
pub trait GraphQuery: Send + Sync {
    fn query(&self, criteria: &serde_json::Value) -> Result<Vec<GraphMatch>>;
}

impl<F> GraphQuery for F
where
    F: Fn(&serde_json::Value) -> Result<Vec<GraphMatch>> + Send + Sync,
{
    fn query(&self, criteria: &serde_json::Value) -> Result<Vec<GraphMatch>> {
        self(criteria)
    }
}

/// How vector results and graph matches are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeStrategy {
    #[default]
    VectorFirst,
    ReciprocalRank,
}

/// Merges with `strategy`, returning results sorted by score descending, id ascending.
pub fn merge(
    strategy: MergeStrategy,
    vector_results: Vec<SearchResult>,
    graph_matches: Vec<GraphMatch>,
) -> Vec<HybridSearchResult> {
    match strategy {
        MergeStrategy::VectorFirst => merge_vector_first(vector_results, graph_matches),
        MergeStrategy::ReciprocalRank => rrf_fusion(vector_results, graph_matches),
    }
}

/// Union by id. Ids found by both keep the vector hit and are marked `Both`.
pub fn merge_vector_first(
    vector_results: Vec<SearchResult>,
    graph_matches: Vec<GraphMatch>,
) -> Vec<HybridSearchResult> {
    let mut merged: Vec<HybridSearchResult> =
        Vec::with_capacity(vector_results.len() + graph_matches.len());
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(merged.capacity());

    for r in vector_results {
        positions.insert(r.id.clone(), merged.len());
        merged.push(r.into());
    }
    for g in graph_matches {
        match positions.get(&g.id) {
            Some(&pos) => {
                // A repeated graph match must not promote a graph-only hit
                if merged[pos].source == ResultSource::Vector {
                    merged[pos].source = ResultSource::Both;
                }
            }
            None => {
                positions.insert(g.id.clone(), merged.len());
                merged.push(graph_only(g));
            }
        }
    }

    sort_by_score(&mut merged);
    merged
}

/// Reciprocal Rank Fusion over the vector list and the graph list.
/// Graph matches are ranked by their own score, ties on id.
pub fn rrf_fusion(
    vector_results: Vec<SearchResult>,
    mut graph_matches: Vec<GraphMatch>,
) -> Vec<HybridSearchResult> {
    let rrf_k = config::RRF_K;
    let mut merged: Vec<HybridSearchResult> =
        Vec::with_capacity(vector_results.len() + graph_matches.len());
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(merged.capacity());

    for (rank, r) in vector_results.into_iter().enumerate() {
        let mut hit: HybridSearchResult = r.into();
        hit.score = 1.0 / (rrf_k + rank as f32 + 1.0);
        positions.insert(hit.id.clone(), merged.len());
        merged.push(hit);
    }

    graph_matches.sort_by(|a, b| {
        clamp_score(b.score)
            .total_cmp(&clamp_score(a.score))
            .then_with(|| a.id.cmp(&b.id))
    });
    for (rank, g) in graph_matches.into_iter().enumerate() {
        let contribution = 1.0 / (rrf_k + rank as f32 + 1.0);
        match positions.get(&g.id) {
            Some(&pos) => {
                let hit = &mut merged[pos];
                // A repeated graph id contributes once
                if hit.source == ResultSource::Vector {
                    hit.score += contribution;
                    hit.source = ResultSource::Both;
                }
            }
            None => {
                positions.insert(g.id.clone(), merged.len());
                let mut hit = graph_only(g);
                hit.score = contribution;
                merged.push(hit);
            }
        }
    }

    sort_by_score(&mut merged);
    merged
}

fn graph_only(g: GraphMatch) -> HybridSearchResult {
    HybridSearchResult {
        id: g.id,
        score: clamp_score(g.score),
        distance: None,
        metadata: g.metadata,
        vector: None,
        source: ResultSource::Graph,
    }
}

fn clamp_score(score: f32) -> f32 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Score descending, id ascending.
pub(crate) fn sort_by_score(results: &mut [HybridSearchResult]) {
    results.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
}
