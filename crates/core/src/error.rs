//! Error types for the vector store.
//!
//! Absence is not an error: lookups return `Option` and deletes return `bool`.

use thiserror::Error;

/// Errors returned by [`VectorStore`](crate::storage::VectorStore) operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuVectorError {
    /// An operation was attempted before `initialize()`.
    #[error("vector store is not initialized")]
    NotInitialized,

    /// Vector length differs from the configured dimensions.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The configured dimension.
        expected: usize,
        /// The length of the offending vector.
        actual: usize,
    },

    /// A vector element is NaN or infinite.
    #[error("invalid vector: element {index} is not finite ({value})")]
    InvalidVector {
        /// Position of the first non-finite element.
        index: usize,
        /// The offending value.
        value: f32,
    },

    /// Identifier rejected by [`validate_id`](crate::document::validate_id)
    /// or by a batch duplicate policy.
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The graph-query collaborator failed during hybrid search.
    #[error("graph query failed: {0}")]
    GraphQuery(String),

    /// An internal invariant check failed.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, RuVectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_dimension_mismatch() {
        let err = RuVectorError::DimensionMismatch {
            expected: 4,
            actual: 3,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 4, got 3");
    }

    #[test]
    fn test_display_invalid_vector() {
        let err = RuVectorError::InvalidVector {
            index: 2,
            value: f32::NAN,
        };
        assert!(err.to_string().starts_with("invalid vector: element 2"));
    }
}
