//! # vecdb
//!
//! A minimal embedding-vector store.
//!
//! Fixed-dimension `f32` vectors are appended to named collections inside a
//! single file, read back by stable index, overwritten in place, soft-deleted
//! with a NaN tombstone, and ranked against a query through a caller-supplied
//! [`Scorer`].
//!
//! ## Layers
//!
//! - [`storage::ArrayBackend`]: named, row-resizable 2-D `f32` arrays
//!   ([`FileContainer`] on disk, [`MemoryContainer`] in process)
//! - [`DatasetStore`]: store / get / update / delete over collections
//! - [`SimilarityService`]: linear-scan ranking of live rows
//!
//! ## Example
//!
//! ```rust,no_run
//! use vecdb::{CosineSimilarity, Order, VecDb, DEFAULT_COLLECTION};
//!
//! # fn main() -> vecdb::Result<()> {
//! let db = VecDb::open("data.vdb", 4)?;
//! db.store(&[vec![1.0, 0.0, 0.0, 0.0], vec![0.0, 1.0, 0.0, 0.0]], DEFAULT_COLLECTION)?;
//! db.delete(1, DEFAULT_COLLECTION)?;
//!
//! let best = db.most(&[0.9, 0.1, 0.0, 0.0], &CosineSimilarity, 1, Order::Descending, DEFAULT_COLLECTION)?;
//! assert_eq!(best.first(), Some(0));
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use thiserror::Error as ThisError;

pub mod config;
pub mod models;
pub mod observability;
pub mod scoring;
pub mod services;
pub mod storage;

pub use config::VecdbConfig;
pub use models::{Matrix, Most, Order, Ranking};
pub use scoring::{CosineSimilarity, DotProduct, EuclideanDistance, Metric, NegativeEuclidean, Scorer};
pub use services::SimilarityService;
pub use storage::{
    ArrayBackend, Collection, DEFAULT_COLLECTION, DatasetStore, FileContainer, MemoryContainer,
    VecDb,
};

/// Error type for vecdb operations.
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `DimensionMismatch` | A row or query width differs from the store's `emb_dim` |
/// | `IndexOutOfRange` | An index is outside `[0, row_count)` |
/// | `CollectionNotFound` | A read or mutation targets a collection never created |
/// | `NoLiveRows` | `most(n = 1)` on a collection with no live rows |
/// | `ScoringFailed` | The scorer errored or returned a malformed result |
/// | `StorageIo` | The backing file is unreadable, unwritable, or corrupt |
/// | `InvalidInput` | Empty batches, bad collection names, NaN components, bad config |
/// | `OperationFailed` | Process setup outside the store failed (logging) |
#[derive(Debug, ThisError)]
pub enum Error {
    /// A vector's width does not match the store's embedding dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The store's embedding dimension.
        expected: usize,
        /// The offending width.
        actual: usize,
    },

    /// Row index outside the collection's range.
    #[error("index {index} out of range for collection with {row_count} rows")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of rows in the collection.
        row_count: usize,
    },

    /// The named collection does not exist in the store.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// Ranking requested a single winner but no live rows exist.
    #[error("collection '{0}' has no live rows")]
    NoLiveRows(String),

    /// The scoring callback failed or returned a malformed result.
    #[error("scoring failed: {cause}")]
    ScoringFailed {
        /// The underlying cause.
        cause: String,
    },

    /// The backing container could not be read or written.
    #[error("storage operation '{operation}' failed: {cause}")]
    StorageIo {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A process-level operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Builds a [`Error::StorageIo`] from an operation name and any displayable cause.
    pub(crate) fn storage(operation: &str, cause: impl std::fmt::Display) -> Self {
        Self::StorageIo {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for vecdb operations.
pub type Result<T> = std::result::Result<T, Error>;
