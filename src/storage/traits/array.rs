//! Array backend trait.
//!
//! The capability a [`DatasetStore`](crate::DatasetStore) is built on: a set of
//! named 2-D `f32` arrays whose column count is fixed and whose row count can
//! only grow.
//!
//! # Available Implementations
//!
//! | Backend | Use Case |
//! |---------|----------|
//! | `FileContainer` | Single binary file on disk (default) |
//! | `MemoryContainer` | Process-local, for tests and scratch data |

use crate::Result;
use crate::models::Matrix;

/// Trait for named, row-resizable 2-D array stores.
///
/// # Implementor Notes
///
/// - Methods use `&self`; mutable state needs interior mutability
/// - Every array shares the width reported by [`dimensions`](Self::dimensions)
/// - Rows are never removed or reordered
pub trait ArrayBackend {
    /// Column count shared by every array.
    fn dimensions(&self) -> usize;

    /// Names of all arrays.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn collections(&self) -> Result<Vec<String>>;

    /// Row count of an array, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn row_count(&self, name: &str) -> Result<Option<usize>>;

    /// Appends rows to an array, creating it if missing.
    ///
    /// Returns the row count after the append.
    ///
    /// # Errors
    ///
    /// Returns an error if the rows cannot be written.
    fn append(&self, name: &str, rows: &Matrix) -> Result<usize>;

    /// Reads one row.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` or `IndexOutOfRange` for bad addresses.
    fn read_row(&self, name: &str, index: usize) -> Result<Vec<f32>>;

    /// Overwrites one row in place.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` or `IndexOutOfRange` for bad addresses.
    fn write_row(&self, name: &str, index: usize, row: &[f32]) -> Result<()>;

    /// Reads every row of an array in index order.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` if the array does not exist.
    fn read_all(&self, name: &str) -> Result<Matrix>;
}
