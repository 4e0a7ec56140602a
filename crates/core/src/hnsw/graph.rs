//! HNSW graph structure: the node arena and global index state.
//!
//! Nodes live in an arena indexed by a stable `u32` slot. Adjacency lists store
//! slots, never references, and a string-id map resolves caller ids to slots.
//! Freed slots are recycled by later inserts.

use crate::config::IndexConfig;
use crate::document::{Metadata, VectorEntry};
use crate::error::{Result, RuVectorError};
use crate::hnsw::distance::DistanceMetric;
use crate::hnsw::level::LevelSource;
use crate::hnsw::visited::VisitedSet;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// A node in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: Metadata,
    /// Highest level this node is linked into.
    pub level: usize,
    /// `neighbors[l]` holds neighbor slots at level `l`, for `l` in `0..=level`.
    pub neighbors: Vec<Vec<u32>>,
}

impl Node {
    fn new(entry: VectorEntry, level: usize) -> Self {
        Self {
            id: entry.id,
            vector: entry.vector,
            metadata: entry.metadata,
            level,
            neighbors: vec![Vec::new(); level + 1],
        }
    }

    pub fn to_entry(&self) -> VectorEntry {
        VectorEntry {
            id: self.id.clone(),
            vector: self.vector.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

/// In-memory HNSW graph. Single source of truth for nodes, entry point and
/// maximum level.
pub struct HnswGraph {
    pub(crate) config: IndexConfig,
    nodes: Vec<Option<Node>>,
    free_slots: Vec<u32>,
    slots: HashMap<String, u32>,
    pub(crate) entry_point: Option<u32>,
    pub(crate) max_level: usize,
    pub(crate) levels: Box<dyn LevelSource>,
    /// Reused by connectivity walks during pruning and repair.
    pub(crate) scratch: VisitedSet,
}

impl fmt::Debug for HnswGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HnswGraph")
            .field("config", &self.config)
            .field("len", &self.len())
            .field("entry_point", &self.entry_point_id())
            .field("max_level", &self.max_level)
            .finish_non_exhaustive()
    }
}

impl HnswGraph {
    /// Creates an empty graph drawing node levels from `levels`.
    pub fn new(config: IndexConfig, levels: Box<dyn LevelSource>) -> Self {
        Self {
            config,
            nodes: Vec::new(),
            free_slots: Vec::new(),
            slots: HashMap::new(),
            entry_point: None,
            max_level: 0,
            levels,
            scratch: VisitedSet::default(),
        }
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    pub fn metric(&self) -> DistanceMetric {
        self.config.distance_metric
    }

    /// `M`: target neighbors per node per level.
    pub fn max_connections(&self) -> usize {
        self.config.max_connections
    }

    pub fn max_level(&self) -> usize {
        self.max_level
    }

    pub fn entry_point_id(&self) -> Option<&str> {
        self.entry_point.map(|slot| self.node(slot).id.as_str())
    }

    /// Number of arena slots, live or free. Bounds every slot value.
    pub(crate) fn capacity(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.slots.get(id).map(|&slot| self.node(slot))
    }

    pub(crate) fn slot_of(&self, id: &str) -> Option<u32> {
        self.slots.get(id).copied()
    }

    /// Live node at `slot`.
    ///
    /// # Panics
    ///
    /// Panics if the slot is free. Adjacency lists only ever hold live slots, so
    /// reaching a free one means the graph is corrupted.
    #[inline]
    pub(crate) fn node(&self, slot: u32) -> &Node {
        match self.nodes.get(slot as usize) {
            Some(Some(node)) => node,
            _ => panic!("HNSW graph references free slot {slot}"),
        }
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, slot: u32) -> &mut Node {
        match self.nodes.get_mut(slot as usize) {
            Some(Some(node)) => node,
            _ => panic!("HNSW graph references free slot {slot}"),
        }
    }

    /// Iterates live nodes in slot order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().flatten()
    }

    /// Iterates live `(slot, node)` pairs in slot order.
    pub(crate) fn live_slots(&self) -> impl Iterator<Item = (u32, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(slot, node)| node.as_ref().map(|n| (slot as u32, n)))
    }

    /// Ids of all live nodes in slot order.
    pub fn ids(&self) -> Vec<String> {
        self.nodes().map(|n| n.id.clone()).collect()
    }

    /// Distance from `query` to the node at `slot`.
    #[inline]
    pub(crate) fn distance_to(&self, query: &[f32], slot: u32) -> f32 {
        self.config
            .distance_metric
            .distance_unchecked(query, &self.node(slot).vector)
    }

    #[inline]
    pub(crate) fn distance_between(&self, a: u32, b: u32) -> f32 {
        self.config
            .distance_metric
            .distance_unchecked(&self.node(a).vector, &self.node(b).vector)
    }

    /// Total order on `(distance, slot)` pairs: distance first, then id.
    #[inline]
    pub(crate) fn cmp_scored(&self, a: (f32, u32), b: (f32, u32)) -> Ordering {
        a.0.total_cmp(&b.0)
            .then_with(|| self.node(a.1).id.cmp(&self.node(b.1).id))
    }

    /// Places a new node in the arena, reusing a free slot when one exists.
    pub(crate) fn allocate(&mut self, entry: VectorEntry, level: usize) -> u32 {
        let id = entry.id.clone();
        let node = Node::new(entry, level);
        let slot = match self.free_slots.pop() {
            Some(slot) => {
                self.nodes[slot as usize] = Some(node);
                slot
            }
            None => {
                self.nodes.push(Some(node));
                (self.nodes.len() - 1) as u32
            }
        };
        self.slots.insert(id, slot);
        slot
    }

    /// Takes a node out of the arena. Links pointing at it must already be gone
    /// or be removed by the caller before the slot is touched again.
    pub(crate) fn release(&mut self, slot: u32) -> Option<Node> {
        let node = self.nodes.get_mut(slot as usize)?.take()?;
        self.slots.remove(&node.id);
        self.free_slots.push(slot);
        Some(node)
    }

    /// Adds the undirected edge `a <-> b` at `level`. No-op if already linked.
    pub(crate) fn link(&mut self, a: u32, b: u32, level: usize) {
        if a == b {
            return;
        }
        let list = &mut self.node_mut(a).neighbors[level];
        if !list.contains(&b) {
            list.push(b);
        }
        let list = &mut self.node_mut(b).neighbors[level];
        if !list.contains(&a) {
            list.push(a);
        }
    }

    /// Removes the undirected edge `a <-> b` at `level`.
    pub(crate) fn unlink(&mut self, a: u32, b: u32, level: usize) {
        self.node_mut(a).neighbors[level].retain(|&s| s != b);
        self.node_mut(b).neighbors[level].retain(|&s| s != a);
    }

    /// Trims `slot`'s neighbor list at `level` to `m`, dropping the farthest
    /// neighbors first (ties on id). Dropped neighbors lose their back-link too.
    ///
    /// An edge that is the only path between its two ends is passed over for
    /// the next farthest. If every edge is such a bridge, the farthest is
    /// dropped anyway and the part it led to is reattached elsewhere.
    pub(crate) fn prune(&mut self, slot: u32, level: usize, m: usize) {
        while self.node(slot).neighbors[level].len() > m {
            let farthest_first = self.neighbors_farthest_first(slot, level);
            let dropped = farthest_first
                .iter()
                .any(|&n| self.unlink_if_redundant(slot, n, level));
            if !dropped {
                let farthest = farthest_first[0];
                self.unlink(slot, farthest, level);
                self.reconnect(farthest, slot, level);
            }
        }
    }

    /// Removes every node and resets the entry point and maximum level.
    /// Returns the number of nodes removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.len();
        self.nodes.clear();
        self.free_slots.clear();
        self.slots.clear();
        self.entry_point = None;
        self.max_level = 0;
        removed
    }

    /// Replaces the index parameters of an empty graph.
    pub(crate) fn reconfigure(&mut self, config: IndexConfig) {
        debug_assert!(self.is_empty());
        self.levels.set_max_connections(config.max_connections);
        self.config = config;
        self.clear();
    }

    /// Number of nodes whose assigned level is exactly `l`, for each level.
    pub fn level_distribution(&self) -> Vec<usize> {
        if self.is_empty() {
            return Vec::new();
        }
        let mut histogram = vec![0usize; self.max_level + 1];
        for node in self.nodes() {
            histogram[node.level] += 1;
        }
        histogram
    }

    /// Mean number of level-0 neighbors per node.
    pub fn avg_connections(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let total: usize = self.nodes().map(|n| n.neighbors[0].len()).sum();
        total as f64 / self.len() as f64
    }

    /// Estimates heap usage in bytes.
    pub fn estimate_memory_bytes(&self) -> usize {
        let mut total = 0usize;
        for node in self.nodes() {
            total += node.vector.len() * 4 + 24; // f32s + Vec overhead
            total += node.id.len() * 2 + 24; // id in node and in slot map
            total += node.metadata.len() * 64; // rough estimate per metadata entry
            for layer in &node.neighbors {
                total += layer.len() * 4 + 24;
            }
            total += 24 + 8; // Vec<Vec<u32>> overhead + level
        }
        total += self.nodes.len() * std::mem::size_of::<Option<Node>>();
        total += self.free_slots.len() * 4;
        total += self.slots.len() * 8; // slot + map overhead
        total
    }

    /// Checks the structural invariants of the graph.
    ///
    /// Verifies the entry point against emptiness and `max_level`, vector
    /// lengths, adjacency bounds, slot liveness, degree limits and symmetry.
    /// Finally, every node linked into a level must be reachable from the
    /// entry point at that level.
    pub fn validate(&self) -> Result<()> {
        let dims = self.config.dimensions;
        let m = self.config.max_connections;

        match self.entry_point {
            None if !self.is_empty() => {
                return Err(internal(format!(
                    "entry point is none but graph holds {} nodes",
                    self.len()
                )));
            }
            Some(ep) => {
                let ep_node = match self.nodes.get(ep as usize) {
                    Some(Some(n)) => n,
                    _ => return Err(internal(format!("entry point slot {ep} is free"))),
                };
                if ep_node.level != self.max_level {
                    return Err(internal(format!(
                        "entry point '{}' has level {} but max level is {}",
                        ep_node.id, ep_node.level, self.max_level
                    )));
                }
            }
            None => {}
        }

        let live = self.nodes().count();
        if live != self.slots.len() {
            return Err(internal(format!(
                "id map holds {} ids but arena holds {} nodes",
                self.slots.len(),
                live
            )));
        }

        for (slot, node) in self.live_slots() {
            if self.slots.get(&node.id) != Some(&slot) {
                return Err(internal(format!(
                    "id '{}' does not map back to slot {slot}",
                    node.id
                )));
            }
            if node.vector.len() != dims {
                return Err(internal(format!(
                    "node '{}' has {} dimensions, expected {dims}",
                    node.id,
                    node.vector.len()
                )));
            }
            if node.level > self.max_level {
                return Err(internal(format!(
                    "node '{}' level {} exceeds max level {}",
                    node.id, node.level, self.max_level
                )));
            }
            if node.neighbors.len() != node.level + 1 {
                return Err(internal(format!(
                    "node '{}' has {} adjacency levels, expected {}",
                    node.id,
                    node.neighbors.len(),
                    node.level + 1
                )));
            }
            for (level, list) in node.neighbors.iter().enumerate() {
                if list.len() > m {
                    return Err(internal(format!(
                        "node '{}' has {} neighbors at level {level}, limit is {m}",
                        node.id,
                        list.len()
                    )));
                }
                for &n in list {
                    if n == slot {
                        return Err(internal(format!(
                            "node '{}' links to itself at level {level}",
                            node.id
                        )));
                    }
                    let other = match self.nodes.get(n as usize) {
                        Some(Some(other)) => other,
                        _ => {
                            return Err(internal(format!(
                                "node '{}' links to free slot {n} at level {level}",
                                node.id
                            )));
                        }
                    };
                    let symmetric = other
                        .neighbors
                        .get(level)
                        .is_some_and(|back| back.contains(&slot));
                    if !symmetric {
                        return Err(internal(format!(
                            "edge '{}' -> '{}' at level {level} has no back-link",
                            node.id, other.id
                        )));
                    }
                }
            }
        }

        if let Some(ep) = self.entry_point {
            let mut visited = VisitedSet::new(self.capacity());
            for level in 0..=self.max_level {
                visited.reset();
                let reached = self.component_with(ep, level, &mut visited).len();
                let expected = self.nodes().filter(|n| n.level >= level).count();
                if reached != expected {
                    return Err(internal(format!(
                        "{reached} of {expected} nodes reachable from the entry point at level {level}"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn internal(msg: String) -> RuVectorError {
    RuVectorError::Internal(msg)
}
