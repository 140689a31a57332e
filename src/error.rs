//! Error types for building and querying the feature index.

use thiserror::Error;

/// Errors that can occur while building or querying an index.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KdTreeError {
    /// Build input or a query parameter was rejected (no features, ragged
    /// rows, non-finite components, zero leaf threshold or node budget).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A query vector does not have the index's dimension.
    #[error("dimension mismatch: index has {expected} dimensions, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A query was issued against a store with no features.
    #[error("index is empty")]
    EmptyIndex,

    /// Node or permutation storage could not be reserved during build.
    #[error("out of memory: {0}")]
    OutOfMemory(String),
}

pub type Result<T> = std::result::Result<T, KdTreeError>;

impl From<std::collections::TryReserveError> for KdTreeError {
    fn from(err: std::collections::TryReserveError) -> Self {
        KdTreeError::OutOfMemory(err.to_string())
    }
}
