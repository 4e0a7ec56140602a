//! Distance metrics for HNSW search.
//!
//! Supports four distance functions: cosine, euclidean (L2), negative dot
//! product, and manhattan (L1). All metrics return a distance where **lower is
//! better** (more similar), so graph search never needs to know which metric
//! is in use.

use crate::error::{Result, RuVectorError};
use serde::{Deserialize, Serialize};

/// Distance metric used for vector similarity computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DistanceMetric {
    /// Cosine distance: `1 - cosine_similarity`. Range: \[0, 2\].
    #[default]
    Cosine,
    /// Euclidean distance (L2 norm of `a - b`). Range: \[0, ∞).
    Euclidean,
    /// Negative dot product: `-dot(a, b)`. Lower = higher similarity.
    DotProduct,
    /// Manhattan distance (L1 norm of `a - b`). Range: \[0, ∞).
    Manhattan,
}

impl DistanceMetric {
    /// Distance between two vectors. Fails if their lengths differ.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        if a.len() != b.len() {
            return Err(RuVectorError::DimensionMismatch {
                expected: a.len(),
                actual: b.len(),
            });
        }
        Ok(self.distance_unchecked(a, b))
    }

    /// Distance between two vectors of equal length.
    ///
    /// Callers inside the graph guarantee equal lengths; extra elements of the
    /// longer slice are ignored.
    #[inline]
    pub(crate) fn distance_unchecked(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Cosine => cosine_distance(a, b),
            DistanceMetric::Euclidean => euclidean_distance(a, b),
            DistanceMetric::DotProduct => -dot_product(a, b),
            DistanceMetric::Manhattan => manhattan_distance(a, b),
        }
    }

    /// Converts a distance to a similarity score in `[0, 1]`, higher = more similar.
    ///
    /// Cosine maps linearly (`1 - d/2`). Euclidean and manhattan use `1/(1+d)`.
    /// Dot product distances can be negative, so they go through the logistic
    /// `1/(1+e^d)` instead.
    pub fn to_score(&self, distance: f32) -> f32 {
        match self {
            DistanceMetric::Cosine => (1.0 - distance / 2.0).clamp(0.0, 1.0),
            DistanceMetric::Euclidean | DistanceMetric::Manhattan => 1.0 / (1.0 + distance.max(0.0)),
            DistanceMetric::DotProduct => 1.0 / (1.0 + distance.exp()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::DotProduct => "dotProduct",
            DistanceMetric::Manhattan => "manhattan",
        }
    }
}

#[inline]
fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Zero-magnitude vectors have no direction; the similarity term is taken as
/// 0, which saturates the distance at 1.
#[inline]
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    let similarity = (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0);
    1.0 - similarity
}

#[inline]
fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

#[inline]
fn manhattan_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}
