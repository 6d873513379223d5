//! Process-local array container.

use super::acquire_lock;
use crate::models::Matrix;
use crate::storage::traits::ArrayBackend;
use crate::{Error, Result};
use std::sync::Mutex;

/// In-memory array container.
///
/// Same contract as [`FileContainer`](super::FileContainer) without a file;
/// contents are lost on drop. Collections are listed in creation order.
#[derive(Debug)]
pub struct MemoryContainer {
    dimensions: usize,
    arrays: Mutex<Vec<(String, Matrix)>>,
}

impl MemoryContainer {
    /// Creates an empty container.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `dimensions` is zero.
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::InvalidInput(
                "embedding dimension must be positive".to_string(),
            ));
        }
        Ok(Self {
            dimensions,
            arrays: Mutex::new(Vec::new()),
        })
    }

    fn with_array<T>(&self, name: &str, f: impl FnOnce(&mut Matrix) -> Result<T>) -> Result<T> {
        let mut arrays = acquire_lock(&self.arrays);
        let (_, matrix) = arrays
            .iter_mut()
            .find(|(n, _)| n == name)
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))?;
        f(matrix)
    }
}

impl ArrayBackend for MemoryContainer {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn collections(&self) -> Result<Vec<String>> {
        Ok(acquire_lock(&self.arrays)
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn row_count(&self, name: &str) -> Result<Option<usize>> {
        Ok(acquire_lock(&self.arrays)
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m.rows()))
    }

    fn append(&self, name: &str, rows: &Matrix) -> Result<usize> {
        if rows.dimensions() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: rows.dimensions(),
            });
        }

        let mut arrays = acquire_lock(&self.arrays);
        if let Some((_, matrix)) = arrays.iter_mut().find(|(n, _)| n == name) {
            for row in rows.iter_rows() {
                matrix.push_row(row)?;
            }
            return Ok(matrix.rows());
        }
        arrays.push((name.to_string(), rows.clone()));
        Ok(rows.rows())
    }

    fn read_row(&self, name: &str, index: usize) -> Result<Vec<f32>> {
        self.with_array(name, |matrix| {
            let rows = matrix.rows();
            matrix
                .row(index)
                .map(<[f32]>::to_vec)
                .ok_or(Error::IndexOutOfRange {
                    index,
                    row_count: rows,
                })
        })
    }

    fn write_row(&self, name: &str, index: usize, row: &[f32]) -> Result<()> {
        if row.len() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: row.len(),
            });
        }
        self.with_array(name, |matrix| {
            let rows = matrix.rows();
            let target = matrix.row_mut(index).ok_or(Error::IndexOutOfRange {
                index,
                row_count: rows,
            })?;
            target.copy_from_slice(row);
            Ok(())
        })
    }

    fn read_all(&self, name: &str) -> Result<Matrix> {
        self.with_array(name, |matrix| Ok(matrix.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_creates_then_grows() {
        let container = MemoryContainer::new(2).expect("container");
        let first = Matrix::from_rows(&[vec![1.0, 2.0]], 2).expect("rows");
        let more = Matrix::from_rows(&[vec![3.0, 4.0], vec![5.0, 6.0]], 2).expect("rows");

        assert_eq!(container.append("main", &first).expect("append"), 1);
        assert_eq!(container.append("main", &more).expect("append"), 3);
        assert_eq!(container.row_count("main").expect("count"), Some(3));
        assert_eq!(container.read_row("main", 1).expect("read"), vec![3.0, 4.0]);
    }

    #[test]
    fn test_write_row_bounds() {
        let container = MemoryContainer::new(2).expect("container");
        container
            .append("main", &Matrix::from_rows(&[vec![0.0, 0.0]], 2).expect("rows"))
            .expect("append");

        container.write_row("main", 0, &[7.0, 8.0]).expect("write");
        assert_eq!(container.read_row("main", 0).expect("read"), vec![7.0, 8.0]);
        assert!(matches!(
            container.write_row("main", 1, &[0.0, 0.0]),
            Err(Error::IndexOutOfRange { index: 1, row_count: 1 })
        ));
        assert!(matches!(
            container.read_all("missing"),
            Err(Error::CollectionNotFound(_))
        ));
    }
}
