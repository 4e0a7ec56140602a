//! Bulk loading with per-entry error isolation and progress reporting.

use crate::config::BATCH_PROGRESS_CHUNK;
use crate::document::VectorEntry;
use crate::error::RuVectorError;
use crate::hnsw::HnswGraph;
use serde::Serialize;
use std::fmt;

/// What to do with an entry whose id is already in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Leave the existing entry and count the new one as skipped.
    Skip,
    /// Replace the existing entry.
    #[default]
    Overwrite,
    /// Record an `InvalidId` error for the entry.
    Fail,
}

impl DuplicatePolicy {
    /// Maps the `skipDuplicates` flag: `true` skips, `false` overwrites.
    pub fn from_skip_duplicates(skip: bool) -> Self {
        if skip {
            DuplicatePolicy::Skip
        } else {
            DuplicatePolicy::Overwrite
        }
    }
}

/// Counters passed to the progress callback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    pub processed: usize,
    pub total: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// A batch insert request.
///
/// The progress callback runs while the store's write lock is held and must
/// not call back into the store.
pub struct BatchInsert<'a> {
    pub entries: Vec<VectorEntry>,
    pub on_progress: Option<Box<dyn FnMut(&BatchProgress) + 'a>>,
    pub duplicates: DuplicatePolicy,
}

impl fmt::Debug for BatchInsert<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchInsert")
            .field("entries", &self.entries.len())
            .field("on_progress", &self.on_progress.is_some())
            .field("duplicates", &self.duplicates)
            .finish()
    }
}

impl<'a> BatchInsert<'a> {
    pub fn new(entries: Vec<VectorEntry>) -> Self {
        Self {
            entries,
            on_progress: None,
            duplicates: DuplicatePolicy::default(),
        }
    }

    pub fn skip_duplicates(mut self, skip: bool) -> Self {
        self.duplicates = DuplicatePolicy::from_skip_duplicates(skip);
        self
    }

    pub fn with_policy(mut self, duplicates: DuplicatePolicy) -> Self {
        self.duplicates = duplicates;
        self
    }

    pub fn on_progress(mut self, callback: impl FnMut(&BatchProgress) + 'a) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }
}

/// A failed entry: its position in the batch, its id and the error.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchError {
    pub index: usize,
    pub id: String,
    pub error: RuVectorError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchInsertResult {
    pub inserted_count: usize,
    pub skipped_count: usize,
    pub errors: Vec<BatchError>,
}

/// Applies every entry of `batch` to `graph`. Returns the result and the ids
/// that were inserted, in order.
pub(crate) fn apply(graph: &mut HnswGraph, batch: BatchInsert<'_>) -> (BatchInsertResult, Vec<String>) {
    let BatchInsert {
        entries,
        mut on_progress,
        duplicates,
    } = batch;
    let total = entries.len();
    let mut result = BatchInsertResult::default();
    let mut inserted_ids = Vec::with_capacity(total);

    for (index, entry) in entries.into_iter().enumerate() {
        let duplicate = graph.contains(&entry.id);
        match (duplicate, duplicates) {
            (true, DuplicatePolicy::Skip) => result.skipped_count += 1,
            (true, DuplicatePolicy::Fail) => {
                let error = RuVectorError::InvalidId(format!("duplicate id '{}'", entry.id));
                tracing::warn!("Batch entry {} rejected: {}", index, error);
                result.errors.push(BatchError {
                    index,
                    id: entry.id,
                    error,
                });
            }
            _ => {
                let id = entry.id.clone();
                match graph.insert(entry) {
                    Ok(_) => {
                        result.inserted_count += 1;
                        inserted_ids.push(id);
                    }
                    Err(error) => {
                        tracing::warn!("Batch entry {} ('{}') failed: {}", index, id, error);
                        result.errors.push(BatchError { index, id, error });
                    }
                }
            }
        }

        let processed = index + 1;
        if processed % BATCH_PROGRESS_CHUNK == 0 || processed == total {
            if let Some(callback) = on_progress.as_mut() {
                callback(&BatchProgress {
                    processed,
                    total,
                    inserted: result.inserted_count,
                    skipped: result.skipped_count,
                    failed: result.errors.len(),
                });
            }
        }
    }

    (result, inserted_ids)
}
