//! Dataset store: CRUD over named collections of fixed-width vectors.
//!
//! Indices are permanent. Deleting a row overwrites it with a NaN tombstone
//! instead of removing it, so every later index keeps pointing at the same
//! vector and external records keyed by index stay valid.

use super::container::{FileContainer, MemoryContainer};
use super::metrics::{record_operation_metrics, status_label};
use super::traits::ArrayBackend;
use crate::models::{Matrix, Most, Order, Ranking, is_tombstone, tombstone_row};
use crate::scoring::Scorer;
use crate::services::SimilarityService;
use crate::{Error, Result};
use std::path::Path;
use std::time::Instant;
use tracing::instrument;

/// Collection used when callers do not name one.
pub const DEFAULT_COLLECTION: &str = "main";

/// Conventional container filename.
pub const DEFAULT_PATH: &str = "data.vdb";

/// A file-backed store.
pub type VecDb = DatasetStore<FileContainer>;

/// Durable store of fixed-width vectors grouped into named collections.
///
/// Every operation goes through the backend; nothing is cached between calls,
/// so changes made by other handles to the same file are always visible.
#[derive(Debug)]
pub struct DatasetStore<B = FileContainer> {
    backend: B,
}

impl DatasetStore<FileContainer> {
    /// Opens the store at `path`, creating an empty container if missing.
    ///
    /// An existing file's width is not compared with `emb_dim` here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a zero `emb_dim` and
    /// [`Error::StorageIo`] if a new container cannot be created.
    pub fn open(path: impl AsRef<Path>, emb_dim: usize) -> Result<Self> {
        Ok(Self::with_backend(FileContainer::open(path, emb_dim)?))
    }

    /// Opens the store at [`DEFAULT_PATH`] in the working directory.
    ///
    /// # Errors
    ///
    /// See [`open`](Self::open).
    pub fn open_default(emb_dim: usize) -> Result<Self> {
        Self::open(DEFAULT_PATH, emb_dim)
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.backend.path()
    }
}

impl DatasetStore<MemoryContainer> {
    /// Creates a store that lives only in this process.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a zero `emb_dim`.
    pub fn in_memory(emb_dim: usize) -> Result<Self> {
        Ok(Self::with_backend(MemoryContainer::new(emb_dim)?))
    }
}

impl<B: ArrayBackend> DatasetStore<B> {
    /// Wraps an existing backend.
    pub const fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    /// Returns the backend.
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// The embedding dimension every row conforms to.
    pub fn dimensions(&self) -> usize {
        self.backend.dimensions()
    }

    /// Appends rows to `collection`, creating it if needed.
    ///
    /// Returns the index of the last row written, which for a batch of `k`
    /// rows is `old_count + k - 1`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if any row has the wrong width and
    /// [`Error::InvalidInput`] for an empty batch, a bad collection name, or a
    /// NaN component.
    #[instrument(skip(self, vectors), fields(operation = "store", count = vectors.len()))]
    pub fn store<R: AsRef<[f32]>>(&self, vectors: &[R], collection: &str) -> Result<usize> {
        let start = Instant::now();
        let result = (|| {
            validate_collection_name(collection)?;
            if vectors.is_empty() {
                return Err(Error::InvalidInput("no vectors to store".to_string()));
            }
            let rows = Matrix::from_rows(vectors, self.dimensions())?;
            for row in rows.iter_rows() {
                validate_components(row)?;
            }
            let row_count = self.backend.append(collection, &rows)?;
            tracing::debug!(collection, added = rows.rows(), row_count, "Stored vectors");
            Ok(row_count - 1)
        })();

        record_operation_metrics("store", start, status_label(&result));
        result
    }

    /// Appends a flat buffer reshaped into rows of `emb_dim` values.
    ///
    /// A single vector is a buffer of exactly `emb_dim` values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the buffer length is not a
    /// multiple of `emb_dim`, otherwise as [`store`](Self::store).
    pub fn store_flat(&self, values: &[f32], collection: &str) -> Result<usize> {
        let dims = self.dimensions();
        if values.len() % dims != 0 {
            return Err(Error::DimensionMismatch {
                expected: dims,
                actual: values.len(),
            });
        }
        let rows: Vec<&[f32]> = values.chunks_exact(dims).collect();
        self.store(&rows, collection)
    }

    /// Reads the row at `index`, tombstoned or not.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CollectionNotFound`] or [`Error::IndexOutOfRange`].
    #[instrument(skip(self), fields(operation = "get"))]
    pub fn get(&self, index: usize, collection: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let result = self.backend.read_row(collection, index);
        record_operation_metrics("get", start, status_label(&result));
        result
    }

    /// Reads every row of `collection` in index order, tombstones included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CollectionNotFound`] if the collection does not exist.
    #[instrument(skip(self), fields(operation = "get_all"))]
    pub fn get_all(&self, collection: &str) -> Result<Matrix> {
        let start = Instant::now();
        let result = self.backend.read_all(collection);
        record_operation_metrics("get_all", start, status_label(&result));
        result
    }

    /// Overwrites the row at `index`. A tombstoned row becomes live again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`], [`Error::DimensionMismatch`],
    /// [`Error::CollectionNotFound`], or [`Error::InvalidInput`] for NaN
    /// components.
    #[instrument(skip(self, vector), fields(operation = "update"))]
    pub fn update(&self, index: usize, vector: &[f32], collection: &str) -> Result<()> {
        let start = Instant::now();
        let result = (|| {
            if vector.len() != self.dimensions() {
                return Err(Error::DimensionMismatch {
                    expected: self.dimensions(),
                    actual: vector.len(),
                });
            }
            validate_components(vector)?;
            self.backend.write_row(collection, index, vector)
        })();

        record_operation_metrics("update", start, status_label(&result));
        result
    }

    /// Tombstones the row at `index`. Row count and other rows are untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CollectionNotFound`] or [`Error::IndexOutOfRange`].
    #[instrument(skip(self), fields(operation = "delete"))]
    pub fn delete(&self, index: usize, collection: &str) -> Result<()> {
        let start = Instant::now();
        let result = self
            .backend
            .write_row(collection, index, &tombstone_row(self.dimensions()));
        if result.is_ok() {
            tracing::info!(collection, index, "Tombstoned vector");
            metrics::counter!("vectors_tombstoned_total").increment(1);
        }

        record_operation_metrics("delete", start, status_label(&result));
        result
    }

    /// Number of rows in `collection`, tombstones included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CollectionNotFound`] if the collection does not exist.
    pub fn row_count(&self, collection: &str) -> Result<usize> {
        self.backend
            .row_count(collection)?
            .ok_or_else(|| Error::CollectionNotFound(collection.to_string()))
    }

    /// Number of rows in `collection` that are not tombstones.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CollectionNotFound`] if the collection does not exist.
    pub fn live_count(&self, collection: &str) -> Result<usize> {
        let matrix = self.get_all(collection)?;
        Ok(matrix.rows() - matrix.tombstoned_indices().len())
    }

    /// Whether the row at `index` is a tombstone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CollectionNotFound`] or [`Error::IndexOutOfRange`].
    pub fn is_tombstone(&self, index: usize, collection: &str) -> Result<bool> {
        Ok(is_tombstone(&self.get(index, collection)?))
    }

    /// Names of all collections.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub fn collections(&self) -> Result<Vec<String>> {
        self.backend.collections()
    }

    /// Whether `collection` exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub fn contains(&self, collection: &str) -> Result<bool> {
        Ok(self.backend.row_count(collection)?.is_some())
    }

    /// A handle bound to one collection.
    pub fn collection(&self, name: impl Into<String>) -> Collection<'_, B> {
        Collection {
            store: self,
            name: name.into(),
        }
    }

    /// A handle bound to [`DEFAULT_COLLECTION`].
    pub fn default_collection(&self) -> Collection<'_, B> {
        self.collection(DEFAULT_COLLECTION)
    }

    /// The similarity service reading from this store.
    pub const fn similarity(&self) -> SimilarityService<'_, B> {
        SimilarityService::new(self)
    }

    /// Ranks the live rows of `collection` against `query`.
    ///
    /// # Errors
    ///
    /// See [`SimilarityService::compare`].
    pub fn compare<S: Scorer + ?Sized>(
        &self,
        query: &[f32],
        scorer: &S,
        order: Order,
        collection: &str,
    ) -> Result<Ranking> {
        self.similarity().compare(query, scorer, order, collection)
    }

    /// The top `n` live indices of `collection` for `query`.
    ///
    /// # Errors
    ///
    /// See [`SimilarityService::most`].
    pub fn most<S: Scorer + ?Sized>(
        &self,
        query: &[f32],
        scorer: &S,
        n: usize,
        order: Order,
        collection: &str,
    ) -> Result<Most> {
        self.similarity().most(query, scorer, n, order, collection)
    }
}

/// A [`DatasetStore`] bound to one collection name.
#[derive(Debug)]
pub struct Collection<'a, B = FileContainer> {
    store: &'a DatasetStore<B>,
    name: String,
}

impl<B: ArrayBackend> Collection<'_, B> {
    /// The collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// See [`DatasetStore::store`].
    ///
    /// # Errors
    ///
    /// See [`DatasetStore::store`].
    pub fn store<R: AsRef<[f32]>>(&self, vectors: &[R]) -> Result<usize> {
        self.store.store(vectors, &self.name)
    }

    /// See [`DatasetStore::store_flat`].
    ///
    /// # Errors
    ///
    /// See [`DatasetStore::store_flat`].
    pub fn store_flat(&self, values: &[f32]) -> Result<usize> {
        self.store.store_flat(values, &self.name)
    }

    /// See [`DatasetStore::get`].
    ///
    /// # Errors
    ///
    /// See [`DatasetStore::get`].
    pub fn get(&self, index: usize) -> Result<Vec<f32>> {
        self.store.get(index, &self.name)
    }

    /// See [`DatasetStore::get_all`].
    ///
    /// # Errors
    ///
    /// See [`DatasetStore::get_all`].
    pub fn get_all(&self) -> Result<Matrix> {
        self.store.get_all(&self.name)
    }

    /// See [`DatasetStore::update`].
    ///
    /// # Errors
    ///
    /// See [`DatasetStore::update`].
    pub fn update(&self, index: usize, vector: &[f32]) -> Result<()> {
        self.store.update(index, vector, &self.name)
    }

    /// See [`DatasetStore::delete`].
    ///
    /// # Errors
    ///
    /// See [`DatasetStore::delete`].
    pub fn delete(&self, index: usize) -> Result<()> {
        self.store.delete(index, &self.name)
    }

    /// See [`DatasetStore::row_count`].
    ///
    /// # Errors
    ///
    /// See [`DatasetStore::row_count`].
    pub fn row_count(&self) -> Result<usize> {
        self.store.row_count(&self.name)
    }

    /// See [`DatasetStore::live_count`].
    ///
    /// # Errors
    ///
    /// See [`DatasetStore::live_count`].
    pub fn live_count(&self) -> Result<usize> {
        self.store.live_count(&self.name)
    }

    /// See [`DatasetStore::compare`].
    ///
    /// # Errors
    ///
    /// See [`DatasetStore::compare`].
    pub fn compare<S: Scorer + ?Sized>(
        &self,
        query: &[f32],
        scorer: &S,
        order: Order,
    ) -> Result<Ranking> {
        self.store.compare(query, scorer, order, &self.name)
    }

    /// See [`DatasetStore::most`].
    ///
    /// # Errors
    ///
    /// See [`DatasetStore::most`].
    pub fn most<S: Scorer + ?Sized>(
        &self,
        query: &[f32],
        scorer: &S,
        n: usize,
        order: Order,
    ) -> Result<Most> {
        self.store.most(query, scorer, n, order, &self.name)
    }
}

fn validate_collection_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidInput(
            "collection name must not be empty".to_string(),
        ));
    }
    if name.len() > usize::from(u16::MAX) {
        return Err(Error::InvalidInput(format!(
            "collection name is {} bytes, at most {} allowed",
            name.len(),
            u16::MAX
        )));
    }
    Ok(())
}

/// NaN is reserved for tombstones.
fn validate_components(row: &[f32]) -> Result<()> {
    if let Some(position) = row.iter().position(|v| v.is_nan()) {
        return Err(Error::InvalidInput(format!(
            "component {position} is NaN"
        )));
    }
    Ok(())
}
