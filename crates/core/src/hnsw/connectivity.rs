//! Level connectivity: reachability walks and reattachment of split-off parts.
//!
//! Every level must stay one connected component over the nodes linked into
//! it, or search cannot reach part of the index. Symmetric pruning and hard
//! deletes can both cut the last edge between two parts of a level. The walks
//! here detect that, and `reconnect` splices the parts back together with a
//! single edge between nodes that have room for one.

use crate::hnsw::graph::HnswGraph;
use crate::hnsw::visited::VisitedSet;
use std::collections::VecDeque;

impl HnswGraph {
    /// Slots reachable from `start` over `level` edges, `start` first.
    pub(crate) fn component_with(
        &self,
        start: u32,
        level: usize,
        visited: &mut VisitedSet,
    ) -> Vec<u32> {
        visited.visit(start);
        let mut members = vec![start];
        let mut next = 0;
        while next < members.len() {
            let slot = members[next];
            next += 1;
            for &n in &self.node(slot).neighbors[level] {
                if visited.visit(n) {
                    members.push(n);
                }
            }
        }
        members
    }

    fn component(&mut self, start: u32, level: usize) -> Vec<u32> {
        let mut visited = self.take_scratch();
        let members = self.component_with(start, level, &mut visited);
        self.scratch = visited;
        members
    }

    /// Whether `to` can be reached from `from` over `level` edges.
    pub(crate) fn reaches(&mut self, from: u32, to: u32, level: usize) -> bool {
        if from == to {
            return true;
        }
        let mut visited = self.take_scratch();
        visited.visit(from);
        let mut queue = VecDeque::from([from]);
        let mut found = false;
        'walk: while let Some(slot) = queue.pop_front() {
            for &n in &self.node(slot).neighbors[level] {
                if n == to {
                    found = true;
                    break 'walk;
                }
                if visited.visit(n) {
                    queue.push_back(n);
                }
            }
        }
        self.scratch = visited;
        found
    }

    /// Removes the edge `a <-> b` if `b` can still reach `a` without it.
    /// Returns whether the edge was removed.
    pub(crate) fn unlink_if_redundant(&mut self, a: u32, b: u32, level: usize) -> bool {
        self.unlink(a, b, level);
        if self.reaches(b, a, level) {
            true
        } else {
            self.link(a, b, level);
            false
        }
    }

    /// Joins the part of `level` holding `stray` to the part holding `anchor`.
    ///
    /// The new edge runs from the node nearest `stray` on its side to the node
    /// nearest that one on the anchor side, among nodes with fewer than `M`
    /// links. A side with no such node frees a slot by dropping a redundant edge.
    pub(crate) fn reconnect(&mut self, stray: u32, anchor: u32, level: usize) {
        let Some(near) = self.attach_point(stray, stray, level) else {
            tracing::warn!("No attach point near slot {} at level {}", stray, level);
            return;
        };
        let Some(far) = self.attach_point(anchor, near, level) else {
            tracing::warn!("No attach point near slot {} at level {}", anchor, level);
            return;
        };
        self.link(near, far, level);
        tracing::debug!(
            "Reattached slot {} to slot {} at level {}",
            near,
            far,
            level
        );
    }

    /// Reattaches every part of `level` holding one of `slots` to the part
    /// holding the first of them.
    pub(crate) fn rejoin(&mut self, slots: &[u32], level: usize) {
        let Some((&anchor, rest)) = slots.split_first() else {
            return;
        };
        for &slot in rest {
            if !self.reaches(slot, anchor, level) {
                self.reconnect(slot, anchor, level);
            }
        }
    }

    /// Node of `start`'s component nearest `target` that can take one more edge.
    ///
    /// A connected component always has one: either some node is below `M`, or
    /// the component has a cycle and a node on it can drop a redundant edge.
    fn attach_point(&mut self, start: u32, target: u32, level: usize) -> Option<u32> {
        let m = self.max_connections();
        let mut members: Vec<(f32, u32)> = self
            .component(start, level)
            .into_iter()
            .map(|s| (self.distance_between(target, s), s))
            .collect();
        members.sort_by(|&a, &b| self.cmp_scored(a, b));

        let open = members
            .iter()
            .map(|&(_, s)| s)
            .find(|&s| self.node(s).neighbors[level].len() < m);
        if open.is_some() {
            return open;
        }
        members
            .into_iter()
            .map(|(_, s)| s)
            .find(|&s| self.make_room(s, level))
    }

    /// Drops `slot`'s farthest edge at `level` whose loss keeps both ends
    /// connected. Returns `false` if every edge is a bridge.
    fn make_room(&mut self, slot: u32, level: usize) -> bool {
        let farthest_first = self.neighbors_farthest_first(slot, level);
        farthest_first
            .into_iter()
            .any(|n| self.unlink_if_redundant(slot, n, level))
    }

    /// `slot`'s neighbors at `level`, farthest first (ties on id, descending).
    pub(crate) fn neighbors_farthest_first(&self, slot: u32, level: usize) -> Vec<u32> {
        let mut scored: Vec<(f32, u32)> = self.node(slot).neighbors[level]
            .iter()
            .map(|&n| (self.distance_between(slot, n), n))
            .collect();
        scored.sort_by(|&a, &b| self.cmp_scored(b, a));
        scored.into_iter().map(|(_, n)| n).collect()
    }

    fn take_scratch(&mut self) -> VisitedSet {
        let mut visited = std::mem::take(&mut self.scratch);
        visited.reset();
        visited.ensure_capacity(self.capacity());
        visited
    }
}
