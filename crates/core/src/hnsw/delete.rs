//! HNSW deletion with neighbor repair.
//!
//! A deleted node is unlinked from every level it was part of. Each former
//! neighbor left with fewer than `M` links is reconnected to the nearest of the
//! deleted node's other former neighbors, which keeps the local neighborhood
//! navigable. Parts of a level that only met through the deleted node are then
//! reattached, so the level stays connected. If the entry point is deleted, the
//! remaining node with the highest level (lowest id on ties) takes over.

use crate::hnsw::graph::{HnswGraph, Node};

impl HnswGraph {
    /// Removes the node with `id`, returning it, or `None` if absent.
    pub fn remove(&mut self, id: &str) -> Option<Node> {
        let slot = self.slot_of(id)?;
        let m = self.max_connections();

        // Detach every inbound link before the slot is freed
        let former: Vec<Vec<u32>> = self.node(slot).neighbors.clone();
        for (level, list) in former.iter().enumerate() {
            for &n in list {
                self.node_mut(n).neighbors[level].retain(|&s| s != slot);
            }
        }
        let node = self.release(slot)?;

        for (level, list) in former.iter().enumerate() {
            self.repair_level(list, level, m);
            self.rejoin(list, level);
        }

        if self.is_empty() {
            self.entry_point = None;
            self.max_level = 0;
        } else if self.entry_point == Some(slot) {
            self.elect_entry_point();
        }

        tracing::debug!(
            "Removed node '{}' (level {}), entry point now {:?}",
            node.id,
            node.level,
            self.entry_point_id()
        );
        Some(node)
    }

    /// Reconnects the former neighbors of a deleted node at `level`.
    fn repair_level(&mut self, orphans: &[u32], level: usize, m: usize) {
        for &n in orphans {
            if self.node(n).neighbors[level].len() >= m {
                continue;
            }
            let mut candidates: Vec<(f32, u32)> = orphans
                .iter()
                .copied()
                .filter(|&c| c != n && !self.node(n).neighbors[level].contains(&c))
                .map(|c| (self.distance_between(n, c), c))
                .collect();
            candidates.sort_by(|&a, &b| self.cmp_scored(a, b));

            for (_, c) in candidates {
                if self.node(n).neighbors[level].len() >= m {
                    break;
                }
                self.link(n, c, level);
                self.prune(c, level, m);
            }
        }
    }

    /// Picks the remaining node with the highest level, lowest id on ties.
    fn elect_entry_point(&mut self) {
        let elected = self
            .live_slots()
            .max_by(|(_, a), (_, b)| a.level.cmp(&b.level).then_with(|| b.id.cmp(&a.id)))
            .map(|(slot, node)| (slot, node.level));
        match elected {
            Some((slot, level)) => {
                self.entry_point = Some(slot);
                self.max_level = level;
            }
            None => {
                self.entry_point = None;
                self.max_level = 0;
            }
        }
    }
}
