//! Row-major `f32` matrices with a fixed column count.

use crate::{Error, Result};
use std::slice::ChunksExact;

/// Returns true if every component of `row` is NaN.
///
/// A zero-width row is never a tombstone.
#[must_use]
pub fn is_tombstone(row: &[f32]) -> bool {
    !row.is_empty() && row.iter().all(|v| v.is_nan())
}

/// Builds a tombstone row of the given width.
#[must_use]
pub fn tombstone_row(dimensions: usize) -> Vec<f32> {
    vec![f32::NAN; dimensions]
}

/// A dense, row-major matrix of `f32` values.
///
/// Every row has exactly [`dimensions`](Self::dimensions) columns. This is the
/// shape handed to a [`Scorer`](crate::Scorer) and returned by whole-collection
/// reads.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    dimensions: usize,
    data: Vec<f32>,
}

impl Matrix {
    /// Creates an empty matrix with the given column count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `dimensions` is zero.
    pub fn empty(dimensions: usize) -> Result<Self> {
        Self::from_flat(Vec::new(), dimensions)
    }

    /// Wraps a flat row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `dimensions` is zero and
    /// [`Error::DimensionMismatch`] if the buffer length is not a multiple
    /// of `dimensions`.
    pub fn from_flat(data: Vec<f32>, dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::InvalidInput(
                "matrix dimensions must be positive".to_string(),
            ));
        }
        if data.len() % dimensions != 0 {
            return Err(Error::DimensionMismatch {
                expected: dimensions,
                actual: data.len(),
            });
        }
        Ok(Self { dimensions, data })
    }

    /// Copies a sequence of rows into a matrix, checking every row's width.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] on the first row whose width is
    /// not `dimensions`.
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R], dimensions: usize) -> Result<Self> {
        let mut matrix = Self::empty(dimensions)?;
        matrix.data.reserve(rows.len() * dimensions);
        for row in rows {
            matrix.push_row(row.as_ref())?;
        }
        Ok(matrix)
    }

    /// Appends a row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the row width is wrong.
    pub fn push_row(&mut self, row: &[f32]) -> Result<()> {
        if row.len() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: row.len(),
            });
        }
        self.data.extend_from_slice(row);
        Ok(())
    }

    /// Number of columns.
    #[must_use]
    pub const fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.data.len() / self.dimensions
    }

    /// Returns true if the matrix has no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns row `index`, if present.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        let start = index.checked_mul(self.dimensions)?;
        self.data.get(start..start.checked_add(self.dimensions)?)
    }

    pub(crate) fn row_mut(&mut self, index: usize) -> Option<&mut [f32]> {
        let start = index.checked_mul(self.dimensions)?;
        self.data.get_mut(start..start.checked_add(self.dimensions)?)
    }

    /// Iterates rows in index order.
    #[must_use]
    pub fn iter_rows(&self) -> ChunksExact<'_, f32> {
        self.data.chunks_exact(self.dimensions)
    }

    /// The flat row-major buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Consumes the matrix, returning its flat buffer.
    #[must_use]
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Copies the matrix into one `Vec` per row.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        self.iter_rows().map(<[f32]>::to_vec).collect()
    }

    /// Indices of rows that are tombstones.
    #[must_use]
    pub fn tombstoned_indices(&self) -> Vec<usize> {
        self.iter_rows()
            .enumerate()
            .filter(|(_, row)| is_tombstone(row))
            .map(|(i, _)| i)
            .collect()
    }
}
