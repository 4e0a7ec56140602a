//! Caller-facing entry types.
//!
//! A [`VectorEntry`] is a vector with a unique string id and arbitrary JSON
//! metadata. Entries are never mutated in place; an update is a delete followed
//! by an insert.

use crate::config;
use crate::error::{Result, RuVectorError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Ordered key-value metadata attached to an entry.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A stored vector with its id and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorEntry {
    /// Unique, immutable key.
    pub id: String,
    pub vector: Vec<f32>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl VectorEntry {
    /// Creates an entry with a random UUID v4 id.
    pub fn new(vector: Vec<f32>, metadata: Metadata) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            vector,
            metadata,
        }
    }

    /// Creates an entry with a specific id.
    pub fn with_id(id: impl Into<String>, vector: Vec<f32>, metadata: Metadata) -> Self {
        Self {
            id: id.into(),
            vector,
            metadata,
        }
    }
}

/// Checks an id for use by upsert-facing callers: non-empty, at most
/// [`MAX_ID_LEN`](config::MAX_ID_LEN) bytes, no control characters.
///
/// The store itself accepts any string id.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(RuVectorError::InvalidId("id must not be empty".into()));
    }
    if id.len() > config::MAX_ID_LEN {
        return Err(RuVectorError::InvalidId(format!(
            "id is {} bytes, maximum is {}",
            id.len(),
            config::MAX_ID_LEN
        )));
    }
    if id.chars().any(char::is_control) {
        return Err(RuVectorError::InvalidId(
            "id contains control characters".into(),
        ));
    }
    Ok(())
}

/// Rejects NaN and infinite elements.
pub(crate) fn check_finite(vector: &[f32]) -> Result<()> {
    match vector.iter().position(|x| !x.is_finite()) {
        Some(index) => Err(RuVectorError::InvalidVector {
            index,
            value: vector[index],
        }),
        None => Ok(()),
    }
}
