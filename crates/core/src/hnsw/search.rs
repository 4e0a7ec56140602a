//! HNSW search algorithms: greedy descent, single-layer beam search, and
//! multi-layer KNN.
//!
//! Supports an optional predicate `Fn(u32) -> bool` applied during level-0
//! traversal. Rejected nodes are still used for navigation but are excluded
//! from results. Equal distances are ordered by id so results are deterministic.

use crate::hnsw::graph::HnswGraph;
use crate::hnsw::visited::VisitedSet;
use ordered_float::OrderedFloat;
use std::cell::RefCell;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

thread_local! {
    /// Per-thread visited set reused across queries.
    static SEARCH_VISITED: RefCell<VisitedSet> = RefCell::new(VisitedSet::new(0));
}

/// A node seen during search, ordered by `(distance, id)`.
#[derive(Debug, Clone, Copy)]
struct Scored<'a> {
    distance: OrderedFloat<f32>,
    id: &'a str,
    slot: u32,
}

impl<'a> Scored<'a> {
    #[inline]
    fn new(graph: &'a HnswGraph, query: &[f32], slot: u32) -> Self {
        Self {
            distance: OrderedFloat(graph.distance_to(query, slot)),
            id: graph.node(slot).id.as_str(),
            slot,
        }
    }
}

impl PartialEq for Scored<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scored<'_> {}

impl Ord for Scored<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .cmp(&other.distance)
            .then_with(|| self.id.cmp(other.id))
    }
}

impl PartialOrd for Scored<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Walks from `start` to the local optimum for `query` at `level`, moving only
/// to strictly closer neighbors.
pub(crate) fn greedy_search(graph: &HnswGraph, query: &[f32], start: u32, level: usize) -> u32 {
    let mut best = start;
    let mut best_dist = graph.distance_to(query, start);
    loop {
        let mut improved = false;
        if let Some(list) = graph.node(best).neighbors.get(level) {
            for &n in list {
                let dist = graph.distance_to(query, n);
                if dist < best_dist {
                    best_dist = dist;
                    best = n;
                    improved = true;
                }
            }
        }
        if !improved {
            return best;
        }
    }
}

/// Bounded best-first search of one level.
///
/// Returns up to `ef` nodes accepted by `filter_fn`, nearest first, as
/// `(distance, slot)`. `visited` is reset at the start of each call.
pub(crate) fn search_layer<F: Fn(u32) -> bool>(
    graph: &HnswGraph,
    query: &[f32],
    entry_points: &[u32],
    ef: usize,
    level: usize,
    visited: &mut VisitedSet,
    filter_fn: &F,
) -> Vec<(f32, u32)> {
    visited.reset();
    visited.ensure_capacity(graph.capacity());
    let mut candidates: BinaryHeap<Reverse<Scored<'_>>> = BinaryHeap::with_capacity(ef * 2);
    let mut results: BinaryHeap<Scored<'_>> = BinaryHeap::with_capacity(ef + 1);

    for &ep in entry_points {
        if !visited.visit(ep) {
            continue;
        }
        let scored = Scored::new(graph, query, ep);
        candidates.push(Reverse(scored));
        if filter_fn(ep) {
            results.push(scored);
            if results.len() > ef {
                results.pop();
            }
        }
    }

    while let Some(Reverse(current)) = candidates.pop() {
        // The closest frontier node is worse than everything kept: done
        if results.len() >= ef && results.peek().is_some_and(|worst| current > *worst) {
            break;
        }

        let Some(list) = graph.node(current.slot).neighbors.get(level) else {
            continue;
        };
        for &n in list {
            if !visited.visit(n) {
                continue;
            }
            let scored = Scored::new(graph, query, n);
            let admit = results.len() < ef || results.peek().is_some_and(|worst| scored < *worst);
            if !admit {
                continue;
            }
            candidates.push(Reverse(scored));
            if filter_fn(n) {
                results.push(scored);
                if results.len() > ef {
                    results.pop(); // remove worst
                }
            }
        }
    }

    results
        .into_sorted_vec()
        .into_iter()
        .map(|s| (s.distance.0, s.slot))
        .collect()
}

/// Multi-level KNN search with a level-0 filter predicate.
///
/// Descends greedily from the entry point to level 1, then beam-searches level
/// 0 with `ef = max(ef_search, k)`. If the filter leaves fewer than `k`
/// results, retries with a doubled `ef` up to four times the base. Returns
/// every accepted candidate nearest first; callers truncate to `k`.
pub(crate) fn knn_search<F: Fn(u32) -> bool>(
    graph: &HnswGraph,
    query: &[f32],
    k: usize,
    filter_fn: &F,
) -> Vec<(f32, u32)> {
    let Some(entry_point) = graph.entry_point else {
        return Vec::new();
    };

    SEARCH_VISITED.with(|cell| {
        let mut visited = cell.borrow_mut();

        let mut current = entry_point;
        for level in (1..=graph.max_level).rev() {
            current = greedy_search(graph, query, current, level);
        }

        let base_ef = graph.config.ef_search.max(k);
        let max_ef = (base_ef * 4).min(graph.len()).max(base_ef);
        let mut ef = base_ef;
        loop {
            let results = search_layer(
                graph,
                query,
                std::slice::from_ref(&current),
                ef,
                0,
                &mut visited,
                filter_fn,
            );
            if results.len() >= k || ef >= max_ef {
                return results;
            }
            ef = (ef * 2).min(max_ef);
        }
    })
}

impl HnswGraph {
    /// Greedy single-best descent at `level` starting from `start_id`.
    /// Returns `None` if `start_id` is absent or not linked into `level`.
    pub fn greedy_search(&self, query: &[f32], start_id: &str, level: usize) -> Option<String> {
        let start = self.slot_of(start_id)?;
        if self.node(start).level < level || query.len() != self.dimensions() {
            return None;
        }
        let best = greedy_search(self, query, start, level);
        Some(self.node(best).id.clone())
    }

    /// Beam search of `level` from `start_id`, returning up to `ef`
    /// `(id, distance)` pairs nearest first.
    pub fn search_layer(
        &self,
        query: &[f32],
        start_id: &str,
        ef: usize,
        level: usize,
    ) -> Vec<(String, f32)> {
        let Some(start) = self.slot_of(start_id) else {
            return Vec::new();
        };
        if ef == 0 || self.node(start).level < level || query.len() != self.dimensions() {
            return Vec::new();
        }
        let mut visited = VisitedSet::new(self.capacity());
        search_layer(self, query, &[start], ef, level, &mut visited, &|_| true)
            .into_iter()
            .map(|(distance, slot)| (self.node(slot).id.clone(), distance))
            .collect()
    }
}
