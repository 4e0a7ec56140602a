//! HNSW insertion algorithm.
//!
//! Inserts a vector with bidirectional connections. Neighbor selection is a
//! plain nearest-`M` truncation (ties on id); over-full neighbor lists are
//! re-pruned the same way, except that an edge holding the level together is
//! never the one cut.

use crate::document::{check_finite, VectorEntry};
use crate::error::{Result, RuVectorError};
use crate::hnsw::graph::HnswGraph;
use crate::hnsw::search::{greedy_search, search_layer};
use crate::hnsw::visited::VisitedSet;

/// What an insert did to the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOutcome {
    /// Level drawn for the new node.
    pub level: usize,
    /// An existing node with the same id was removed first.
    pub replaced: bool,
    /// The new node became the entry point.
    pub new_entry_point: bool,
}

impl HnswGraph {
    /// Inserts an entry. An existing node with the same id is deleted first.
    ///
    /// Fails with `DimensionMismatch` or `InvalidVector` before touching the graph.
    pub fn insert(&mut self, entry: VectorEntry) -> Result<InsertOutcome> {
        self.check_vector(&entry.vector)?;

        let replaced = self.remove(&entry.id).is_some();
        let level = self.levels.next_level();
        let query = entry.vector.clone();
        let slot = self.allocate(entry, level);

        // First node: sole member and entry point
        let Some(entry_point) = self.entry_point else {
            self.entry_point = Some(slot);
            self.max_level = level;
            return Ok(InsertOutcome {
                level,
                replaced,
                new_entry_point: true,
            });
        };

        // Phase 1: greedy descent through levels the new node is not part of
        let mut current = entry_point;
        for l in (level + 1..=self.max_level).rev() {
            current = greedy_search(self, &query, current, l);
        }

        // Phase 2: beam search each shared level, link to the nearest M
        let m = self.max_connections();
        let ef = self.config.ef_construction;
        let top = level.min(self.max_level);
        let mut visited = VisitedSet::new(self.capacity());
        let mut layer_eps = vec![current];
        for l in (0..=top).rev() {
            let candidates =
                search_layer(self, &query, &layer_eps, ef, l, &mut visited, &|s| s != slot);
            let selected = select_neighbors(&candidates, m);

            for &n in &selected {
                self.link(slot, n, l);
            }
            // Phase 3: re-prune neighbors pushed over M
            for &n in &selected {
                self.prune(n, l, m);
            }

            layer_eps.clear();
            layer_eps.extend(candidates.iter().map(|&(_, s)| s));
            if layer_eps.is_empty() {
                layer_eps.push(current);
            }
        }

        let new_entry_point = level > self.max_level;
        if new_entry_point {
            self.max_level = level;
            self.entry_point = Some(slot);
        }

        tracing::debug!(
            "Inserted node at slot {} (level {}, {} level-0 neighbors)",
            slot,
            level,
            self.node(slot).neighbors[0].len()
        );
        Ok(InsertOutcome {
            level,
            replaced,
            new_entry_point,
        })
    }

    /// Checks a vector against the configured dimension and rejects non-finite
    /// elements.
    pub(crate) fn check_vector(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions() {
            return Err(RuVectorError::DimensionMismatch {
                expected: self.dimensions(),
                actual: vector.len(),
            });
        }
        check_finite(vector)
    }
}

/// Keeps the `m` nearest of `candidates`, which arrive sorted by `(distance, id)`.
fn select_neighbors(candidates: &[(f32, u32)], m: usize) -> Vec<u32> {
    candidates.iter().take(m).map(|&(_, s)| s).collect()
}
