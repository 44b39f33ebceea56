//! Error types for Aisle's retrieval core.
//!
//! Absence-style errors ([`Error::UnknownProduct`], [`Error::RowNotFound`],
//! [`Error::EmptyIndex`]) signal that a lookup had nothing to return; callers
//! decide whether to skip the candidate or surface the miss. Shape errors
//! ([`Error::DimensionMismatch`], [`Error::Snapshot`]) are fatal to the call
//! (or, at startup, to initialization) because proceeding would silently
//! misalign vectors and metadata.

use thiserror::Error;

/// Result type alias for Aisle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Aisle's retrieval and caching operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A vector's length does not match the index dimensionality.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A search was issued against an index with no vectors loaded.
    #[error("vector index is empty")]
    EmptyIndex,

    /// No catalog row carries the given product name (exact match).
    #[error("unknown product: {0}")]
    UnknownProduct(String),

    /// A row id is out of range for the index or catalog.
    #[error("row {0} not found")]
    RowNotFound(usize),

    /// The startup snapshot is internally inconsistent and must not be used.
    #[error("catalog snapshot rejected: {0}")]
    Snapshot(String),

    /// The underlying index library refused an operation.
    #[error("index error: {0}")]
    Index(&'static str),

    /// The embedding collaborator failed or answered with an unusable body.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Filesystem failure while reading or writing a durable artifact.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
