//! Scoring callbacks for similarity ranking.
//!
//! A [`Scorer`] receives the query (one row of `emb_dim` values) and a dense
//! matrix holding every row of a collection, and returns one score per row.
//! Tombstoned rows reach the scorer as zero vectors, so implementations must
//! accept zero-norm rows.
//!
//! Closures work directly:
//!
//! ```rust
//! use vecdb::{Matrix, Scorer};
//!
//! let manhattan = |query: &[f32], rows: &Matrix| -> anyhow::Result<Vec<f32>> {
//!     Ok(rows
//!         .iter_rows()
//!         .map(|row| row.iter().zip(query).map(|(a, b)| (a - b).abs()).sum())
//!         .collect())
//! };
//! let rows = Matrix::from_rows(&[vec![1.0, 1.0]], 2)?;
//! assert_eq!(manhattan.score(&[0.0, 0.0], &rows)?, vec![2.0]);
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::models::Matrix;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Computes one score per matrix row against a query vector.
pub trait Scorer {
    /// Scores every row of `rows` against `query`.
    ///
    /// # Errors
    ///
    /// Implementations may fail for any reason; the failure is reported to
    /// callers as [`Error::ScoringFailed`](crate::Error::ScoringFailed).
    fn score(&self, query: &[f32], rows: &Matrix) -> anyhow::Result<Vec<f32>>;
}

impl<F> Scorer for F
where
    F: Fn(&[f32], &Matrix) -> anyhow::Result<Vec<f32>>,
{
    fn score(&self, query: &[f32], rows: &Matrix) -> anyhow::Result<Vec<f32>> {
        self(query, rows)
    }
}

fn check_query(query: &[f32], rows: &Matrix) -> anyhow::Result<()> {
    anyhow::ensure!(
        query.len() == rows.dimensions(),
        "query has {} components, rows have {}",
        query.len(),
        rows.dimensions()
    );
    Ok(())
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(a: &[f32]) -> f32 {
    dot(a, a).sqrt()
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Cosine similarity in `[-1, 1]`; rows or queries with zero norm score `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineSimilarity;

impl Scorer for CosineSimilarity {
    fn score(&self, query: &[f32], rows: &Matrix) -> anyhow::Result<Vec<f32>> {
        check_query(query, rows)?;
        let query_norm = norm(query);
        Ok(rows
            .iter_rows()
            .map(|row| {
                let row_norm = norm(row);
                if query_norm == 0.0 || row_norm == 0.0 {
                    0.0
                } else {
                    dot(query, row) / (query_norm * row_norm)
                }
            })
            .collect())
    }
}

/// Raw inner product.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotProduct;

impl Scorer for DotProduct {
    fn score(&self, query: &[f32], rows: &Matrix) -> anyhow::Result<Vec<f32>> {
        check_query(query, rows)?;
        Ok(rows.iter_rows().map(|row| dot(query, row)).collect())
    }
}

/// Euclidean (L2) distance; rank ascending.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanDistance;

impl Scorer for EuclideanDistance {
    fn score(&self, query: &[f32], rows: &Matrix) -> anyhow::Result<Vec<f32>> {
        check_query(query, rows)?;
        Ok(rows
            .iter_rows()
            .map(|row| squared_distance(query, row).sqrt())
            .collect())
    }
}

/// Negated Euclidean distance, so that descending order ranks nearest first.
#[derive(Debug, Clone, Copy, Default)]
pub struct NegativeEuclidean;

impl Scorer for NegativeEuclidean {
    fn score(&self, query: &[f32], rows: &Matrix) -> anyhow::Result<Vec<f32>> {
        Ok(EuclideanDistance
            .score(query, rows)?
            .into_iter()
            .map(|d| -d)
            .collect())
    }
}

/// Built-in scorer selection, used by configuration and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    /// [`CosineSimilarity`].
    #[default]
    Cosine,
    /// [`DotProduct`].
    Dot,
    /// [`EuclideanDistance`].
    Euclidean,
    /// [`NegativeEuclidean`].
    NegEuclidean,
}

impl Metric {
    /// Returns the metric name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Dot => "dot",
            Self::Euclidean => "euclidean",
            Self::NegEuclidean => "neg-euclidean",
        }
    }

    /// Parses a metric name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cosine" | "cos" => Some(Self::Cosine),
            "dot" | "ip" | "inner-product" => Some(Self::Dot),
            "euclidean" | "l2" => Some(Self::Euclidean),
            "neg-euclidean" | "neg_euclidean" | "negative-euclidean" => Some(Self::NegEuclidean),
            _ => None,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Scorer for Metric {
    fn score(&self, query: &[f32], rows: &Matrix) -> anyhow::Result<Vec<f32>> {
        match self {
            Self::Cosine => CosineSimilarity.score(query, rows),
            Self::Dot => DotProduct.score(query, rows),
            Self::Euclidean => EuclideanDistance.score(query, rows),
            Self::NegEuclidean => NegativeEuclidean.score(query, rows),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn unit_rows() -> Matrix {
        Matrix::from_rows(
            &[vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![-1.0, 0.0, 0.0]],
            3,
        )
        .expect("rows")
    }

    #[test]
    fn test_cosine_similarity() {
        let scores = CosineSimilarity
            .score(&[1.0, 0.0, 0.0], &unit_rows())
            .expect("score");
        assert!((scores[0] - 1.0).abs() < 1e-6);
        assert!(scores[1].abs() < 1e-6);
        assert!((scores[2] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_row_scores_zero() {
        let rows = Matrix::from_rows(&[vec![0.0, 0.0, 0.0]], 3).expect("rows");
        let scores = CosineSimilarity.score(&[1.0, 2.0, 3.0], &rows).expect("score");
        assert_eq!(scores, vec![0.0]);
    }

    #[test]
    fn test_euclidean_variants() {
        let rows = unit_rows();
        let distances = EuclideanDistance.score(&[1.0, 0.0, 0.0], &rows).expect("score");
        assert!(distances[0].abs() < 1e-6);
        assert!((distances[1] - 2f32.sqrt()).abs() < 1e-6);
        assert!((distances[2] - 2.0).abs() < 1e-6);

        let negated = NegativeEuclidean.score(&[1.0, 0.0, 0.0], &rows).expect("score");
        assert!(negated.iter().zip(&distances).all(|(n, d)| (n + d).abs() < 1e-6));
    }

    #[test]
    fn test_query_width_checked() {
        let err = DotProduct.score(&[1.0, 0.0], &unit_rows()).unwrap_err();
        assert!(err.to_string().contains("query has 2 components"));
    }

    #[test]
    fn test_closure_scorer() {
        let constant = |_: &[f32], rows: &Matrix| -> anyhow::Result<Vec<f32>> {
            Ok(vec![7.0; rows.rows()])
        };
        assert_eq!(
            constant.score(&[0.0; 3], &unit_rows()).expect("score"),
            vec![7.0, 7.0, 7.0]
        );
    }

    #[test_case("cosine", Some(Metric::Cosine))]
    #[test_case("L2", Some(Metric::Euclidean))]
    #[test_case("neg-euclidean", Some(Metric::NegEuclidean))]
    #[test_case("dot", Some(Metric::Dot))]
    #[test_case("hamming", None)]
    fn test_metric_parse(input: &str, expected: Option<Metric>) {
        assert_eq!(Metric::parse(input), expected);
    }
}
