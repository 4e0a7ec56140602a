//! Random level assignment for new nodes.
//!
//! Levels follow `floor(-ln(U) * mL)` with `mL = 1/ln(M)`, so level 0 holds
//! almost every node and each level above holds roughly `1/M` of the one below.

use crate::config;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of node levels. The store owns one and draws from it on every insert.
pub trait LevelSource: Send + Sync {
    /// Returns the level for the next inserted node.
    fn next_level(&mut self) -> usize;

    /// Called when the store is reconfigured with a new `M`.
    fn set_max_connections(&mut self, _max_connections: usize) {}
}

/// Geometric level generator backed by a seedable [`StdRng`].
#[derive(Debug, Clone)]
pub struct LevelGenerator {
    ml: f64,
    rng: StdRng,
}

impl LevelGenerator {
    /// Generator seeded from OS entropy.
    pub fn new(max_connections: usize) -> Self {
        Self::from_rng(max_connections, StdRng::from_entropy())
    }

    /// Generator with a fixed seed for reproducible graphs.
    pub fn seeded(max_connections: usize, seed: u64) -> Self {
        Self::from_rng(max_connections, StdRng::seed_from_u64(seed))
    }

    pub fn from_rng(max_connections: usize, rng: StdRng) -> Self {
        Self {
            ml: 1.0 / (max_connections as f64).ln(),
            rng,
        }
    }

    /// The level multiplier `1/ln(M)`.
    pub fn level_multiplier(&self) -> f64 {
        self.ml
    }
}

impl LevelSource for LevelGenerator {
    fn next_level(&mut self) -> usize {
        // gen::<f64>() is in [0, 1); flip it to (0, 1] so ln never sees 0
        let r: f64 = 1.0 - self.rng.gen::<f64>();
        let level = (-r.ln() * self.ml).floor() as usize;
        level.min(config::MAX_LAYERS - 1)
    }

    fn set_max_connections(&mut self, max_connections: usize) {
        self.ml = 1.0 / (max_connections as f64).ln();
    }
}
