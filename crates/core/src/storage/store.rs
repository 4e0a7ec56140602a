//! The vector store: a thread-safe handle over one HNSW graph.
//!
//! Every mutation takes the write lock for its full duration; searches share
//! the read lock. Events are delivered after the lock is released.

use crate::config::{RuVectorConfig, MAX_K};
use crate::document::VectorEntry;
use crate::error::{Result, RuVectorError};
use crate::hnsw::search::knn_search;
use crate::hnsw::{HnswGraph, LevelGenerator, LevelSource};
use crate::search::filter::matches_metadata;
use crate::search::hybrid::{self, GraphQuery};
use crate::search::types::{
    HybridQuery, HybridSearchResult, ResultSource, SearchQuery, SearchResult,
};
use crate::storage::batch::{self, BatchInsert, BatchInsertResult};
use crate::storage::events::{EventBus, EventKind, ListenerId, StoreEvent};
use crate::storage::stats::StoreStats;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::SystemTime;

/// State behind the store's lock.
#[derive(Debug)]
struct StoreData {
    config: RuVectorConfig,
    graph: HnswGraph,
    initialized: bool,
    last_updated: Option<SystemTime>,
}

impl StoreData {
    fn ensure_ready(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(RuVectorError::NotInitialized)
        }
    }

    fn touch(&mut self) {
        self.last_updated = Some(SystemTime::now());
    }

    /// Vector search against this snapshot.
    fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        self.ensure_ready()?;
        self.graph.check_vector(&query.vector)?;
        if let Some(min_score) = query.min_score {
            if !min_score.is_finite() {
                return Err(RuVectorError::InvalidConfig(format!(
                    "minScore must be finite, got {min_score}"
                )));
            }
        }
        if query.k == 0 || self.graph.is_empty() {
            return Ok(Vec::new());
        }
        let k = query.k.min(MAX_K);

        let graph = &self.graph;
        let equality = query.filter.as_ref();
        let clause = query.conditions.as_ref();
        let filter_fn = |slot: u32| matches_metadata(&graph.node(slot).metadata, equality, clause);
        let candidates = knn_search(graph, &query.vector, k, &filter_fn);

        let metric = graph.metric();
        let mut results: Vec<SearchResult> = candidates
            .into_iter()
            .filter_map(|(distance, slot)| {
                let score = metric.to_score(distance);
                if query.min_score.is_some_and(|min| score < min) {
                    return None;
                }
                let node = graph.node(slot);
                Some(SearchResult {
                    id: node.id.clone(),
                    score,
                    distance,
                    metadata: node.metadata.clone(),
                    vector: query.include_vectors.then(|| node.vector.clone()),
                })
            })
            .collect();
        results.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        results.truncate(k);
        Ok(results)
    }
}

/// A thread-safe, in-memory HNSW vector store.
///
/// Cloning produces a new handle to the same shared data and listeners.
#[derive(Debug, Clone)]
pub struct VectorStore {
    data: Arc<RwLock<StoreData>>,
    events: Arc<EventBus>,
}

impl VectorStore {
    /// Creates an uninitialized store with an entropy-seeded level generator.
    pub fn new(config: RuVectorConfig) -> Self {
        let levels = LevelGenerator::new(config.index.max_connections);
        Self::with_level_source(config, Box::new(levels))
    }

    /// Creates a store whose node levels are reproducible under `seed`.
    pub fn with_seed(config: RuVectorConfig, seed: u64) -> Self {
        let levels = LevelGenerator::seeded(config.index.max_connections, seed);
        Self::with_level_source(config, Box::new(levels))
    }

    /// Creates a store drawing node levels from `levels`.
    pub fn with_level_source(config: RuVectorConfig, levels: Box<dyn LevelSource>) -> Self {
        let graph = HnswGraph::new(config.index.clone(), levels);
        Self {
            data: Arc::new(RwLock::new(StoreData {
                config,
                graph,
                initialized: false,
                last_updated: None,
            })),
            events: Arc::new(EventBus::default()),
        }
    }

    /// Validates the configuration and readies the store. Idempotent.
    pub fn initialize(&self) -> Result<()> {
        let mut data = self.data.write();
        if data.initialized {
            return Ok(());
        }
        data.config.validate()?;
        data.initialized = true;
        tracing::info!(
            "Initialized vector store: {} dimensions, {} metric, M={}, efConstruction={}, efSearch={}",
            data.config.index.dimensions,
            data.config.index.distance_metric.as_str(),
            data.config.index.max_connections,
            data.config.index.ef_construction,
            data.config.index.ef_search
        );
        Ok(())
    }

    /// Replaces the configuration of an empty store and initializes it.
    pub fn reconfigure(&self, config: RuVectorConfig) -> Result<()> {
        config.validate()?;
        let mut data = self.data.write();
        if !data.graph.is_empty() {
            return Err(RuVectorError::InvalidConfig(format!(
                "cannot reconfigure a store holding {} vectors",
                data.graph.len()
            )));
        }
        data.graph.reconfigure(config.index.clone());
        data.config = config;
        data.initialized = true;
        tracing::info!(
            "Reconfigured vector store: {} dimensions, {} metric",
            data.config.index.dimensions,
            data.config.index.distance_metric.as_str()
        );
        Ok(())
    }

    /// Inserts an entry, replacing any existing entry with the same id.
    pub fn insert(&self, entry: VectorEntry) -> Result<()> {
        let id = entry.id.clone();
        {
            let mut data = self.data.write();
            data.ensure_ready()?;
            data.graph.insert(entry)?;
            data.touch();
        }
        self.events.emit(&StoreEvent::Insert { id });
        Ok(())
    }

    /// Inserts many entries under one write lock. Per-entry failures are
    /// recorded in the result and do not abort the batch.
    pub fn batch_insert(&self, batch: BatchInsert<'_>) -> Result<BatchInsertResult> {
        let (result, inserted) = {
            let mut data = self.data.write();
            data.ensure_ready()?;
            let total = batch.entries.len();
            let (result, inserted) = batch::apply(&mut data.graph, batch);
            if !inserted.is_empty() {
                data.touch();
            }
            tracing::info!(
                "Batch insert of {} entries: {} inserted, {} skipped, {} failed",
                total,
                result.inserted_count,
                result.skipped_count,
                result.errors.len()
            );
            (result, inserted)
        };
        let events: Vec<StoreEvent> = inserted
            .into_iter()
            .map(|id| StoreEvent::Insert { id })
            .collect();
        self.events.emit_all(&events);
        Ok(result)
    }

    /// Returns up to `k` entries nearest to `query.vector`, best first.
    ///
    /// Scores are non-increasing; equal scores are ordered by id.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        self.data.read().search(query)
    }

    /// Vector search merged with matches from an optional graph-query backend.
    ///
    /// The backend is called without holding the store lock. If it fails, the
    /// failure is logged and the vector results are returned on their own.
    pub fn hybrid_search(
        &self,
        query: &HybridQuery,
        graph_query: Option<&dyn GraphQuery>,
    ) -> Result<Vec<HybridSearchResult>> {
        if let Some(min_score) = query.min_score {
            if !min_score.is_finite() {
                return Err(RuVectorError::InvalidConfig(format!(
                    "minScore must be finite, got {min_score}"
                )));
            }
        }
        let vector_results = self.search(&query.vector_query())?;
        if query.k == 0 {
            return Ok(Vec::new());
        }

        let graph_matches = match graph_query {
            Some(backend) => {
                let criteria = query
                    .graph_criteria
                    .clone()
                    .unwrap_or(serde_json::Value::Null);
                match backend.query(&criteria) {
                    Ok(matches) => matches,
                    Err(e) => {
                        tracing::warn!("Graph query failed, returning vector results only: {}", e);
                        Vec::new()
                    }
                }
            }
            None => Vec::new(),
        };

        let mut merged = hybrid::merge(query.merge, vector_results, graph_matches);

        // Graph-only hits on stored ids take the store's metadata
        let data = self.data.read();
        for hit in merged.iter_mut().filter(|h| h.source == ResultSource::Graph) {
            if let Some(node) = data.graph.get(&hit.id) {
                hit.metadata = node.metadata.clone();
                if query.include_vectors {
                    hit.vector = Some(node.vector.clone());
                }
            }
        }
        drop(data);

        let k = query.k.min(MAX_K);
        merged.retain(|hit| {
            query.min_score.map_or(true, |min| hit.score >= min)
                && matches_metadata(
                    &hit.metadata,
                    query.filter.as_ref(),
                    query.conditions.as_ref(),
                )
        });
        merged.truncate(k);
        Ok(merged)
    }

    /// Returns a copy of the entry with `id`, or `None` if absent.
    pub fn get(&self, id: &str) -> Result<Option<VectorEntry>> {
        let data = self.data.read();
        data.ensure_ready()?;
        Ok(data.graph.get(id).map(|node| node.to_entry()))
    }

    /// Removes the entry with `id`. Returns `false` if it was absent.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let removed = {
            let mut data = self.data.write();
            data.ensure_ready()?;
            let removed = data.graph.remove(id).is_some();
            if removed {
                data.touch();
            }
            removed
        };
        if removed {
            self.events.emit(&StoreEvent::Delete { id: id.to_string() });
        }
        Ok(removed)
    }

    /// Removes every entry and resets the index state.
    pub fn clear(&self) -> Result<()> {
        let removed = {
            let mut data = self.data.write();
            data.ensure_ready()?;
            let removed = data.graph.clear();
            data.touch();
            tracing::info!("Cleared vector store ({} vectors removed)", removed);
            removed
        };
        self.events.emit(&StoreEvent::Clear { removed });
        Ok(())
    }

    pub fn get_stats(&self) -> StoreStats {
        let data = self.data.read();
        StoreStats::collect(&data.graph, data.last_updated)
    }

    /// A copy of the current configuration.
    pub fn get_config(&self) -> RuVectorConfig {
        self.data.read().config.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.data.read().initialized
    }

    pub fn size(&self) -> usize {
        self.data.read().graph.len()
    }

    pub fn has(&self, id: &str) -> bool {
        self.data.read().graph.contains(id)
    }

    /// All stored ids in ascending order.
    pub fn get_all_ids(&self) -> Vec<String> {
        let mut ids = self.data.read().graph.ids();
        ids.sort_unstable();
        ids
    }

    /// Registers `listener` for events of `kind`.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(kind, Arc::new(listener))
    }

    /// Unregisters a listener. Returns `false` if it was not registered for `kind`.
    pub fn off(&self, kind: EventKind, id: ListenerId) -> bool {
        self.events.unsubscribe(kind, id)
    }

    /// Checks the graph's structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.data.read().graph.validate()
    }
}
