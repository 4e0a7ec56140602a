//! Epoch-stamped visited set keyed by arena slot.
//!
//! `reset()` bumps an epoch instead of zeroing the stamps, so one allocation
//! serves every layer search of an insert or query.

#[derive(Debug)]
pub struct VisitedSet {
    stamps: Vec<u32>,
    epoch: u32,
}

impl VisitedSet {
    pub fn new(slots: usize) -> Self {
        Self {
            stamps: vec![0; slots],
            epoch: 1,
        }
    }

    /// Forgets every visit. Stamps are only rewritten when the epoch wraps.
    pub fn reset(&mut self) {
        if self.epoch == u32::MAX {
            self.stamps.fill(0);
            self.epoch = 1;
        } else {
            self.epoch += 1;
        }
    }

    /// Grows the set to cover `slots` arena slots.
    pub fn ensure_capacity(&mut self, slots: usize) {
        if slots > self.stamps.len() {
            self.stamps.resize(slots, 0);
        }
    }

    /// Marks `slot` visited. Returns `true` on the first visit since the last reset.
    #[inline]
    pub fn visit(&mut self, slot: u32) -> bool {
        let stamp = &mut self.stamps[slot as usize];
        if *stamp == self.epoch {
            false
        } else {
            *stamp = self.epoch;
            true
        }
    }
}

impl Default for VisitedSet {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_and_reset() {
        let mut visited = VisitedSet::new(8);
        assert!(visited.visit(3));
        assert!(!visited.visit(3));
        visited.reset();
        assert!(visited.visit(3));
    }

    #[test]
    fn test_ensure_capacity_keeps_marks() {
        let mut visited = VisitedSet::new(2);
        visited.visit(1);
        visited.ensure_capacity(10);
        assert!(!visited.visit(1));
        assert!(visited.visit(9));
    }

    #[test]
    fn test_epoch_wrap_clears_stamps() {
        let mut visited = VisitedSet::new(4);
        visited.epoch = u32::MAX;
        visited.visit(2);
        visited.reset();
        assert_eq!(visited.epoch, 1);
        assert!(visited.visit(2));
    }

    #[test]
    fn test_default_is_empty_and_growable() {
        let mut visited = VisitedSet::default();
        visited.ensure_capacity(1);
        assert!(visited.visit(0));
        assert!(!visited.visit(0));
    }
}
