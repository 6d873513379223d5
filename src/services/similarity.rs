//! Linear-scan similarity ranking.
//!
//! A comparison reads the whole collection, swaps tombstoned rows for zero
//! vectors so the scorer sees a dense matrix, scores every row in a single
//! call, then drops the tombstoned positions and sorts what remains.

use crate::models::{Matrix, Most, Order, Ranking};
use crate::scoring::Scorer;
use crate::storage::{ArrayBackend, DatasetStore};
use crate::{Error, Result};
use std::time::Instant;
use tracing::instrument;

/// Ranks the live rows of a collection against a query.
#[derive(Debug)]
pub struct SimilarityService<'a, B> {
    store: &'a DatasetStore<B>,
}

impl<'a, B: ArrayBackend> SimilarityService<'a, B> {
    /// Creates a service reading from `store`.
    pub const fn new(store: &'a DatasetStore<B>) -> Self {
        Self { store }
    }

    /// Scores every live row of `collection` and returns them ranked.
    ///
    /// Tombstoned rows never appear in the result. Ties keep ascending index
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] for a query of the wrong width,
    /// [`Error::CollectionNotFound`] for an unknown collection, and
    /// [`Error::ScoringFailed`] if the scorer fails or returns a malformed
    /// result.
    #[instrument(skip(self, query, scorer, order), fields(operation = "compare", order = %order))]
    pub fn compare<S: Scorer + ?Sized>(
        &self,
        query: &[f32],
        scorer: &S,
        order: Order,
        collection: &str,
    ) -> Result<Ranking> {
        let start = Instant::now();
        let result = (|| {
            let dims = self.store.dimensions();
            if query.len() != dims {
                return Err(Error::DimensionMismatch {
                    expected: dims,
                    actual: query.len(),
                });
            }
            let rows = self.store.get_all(collection)?;
            rank(query, rows, scorer, order)
        })();

        let status = if result.is_ok() { "success" } else { "error" };
        metrics::counter!("similarity_compare_total", "status" => status).increment(1);
        metrics::histogram!("similarity_compare_duration_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);

        if let Ok(ranking) = &result {
            tracing::debug!(collection, ranked = ranking.len(), "Compared collection");
        }
        result
    }

    /// The first `n` indices of [`compare`](Self::compare).
    ///
    /// `n = 1` returns [`Most::One`]; any other `n` returns [`Most::Many`]
    /// holding at most `n` indices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoLiveRows`] when `n = 1` and nothing is live, plus
    /// every error of [`compare`](Self::compare).
    pub fn most<S: Scorer + ?Sized>(
        &self,
        query: &[f32],
        scorer: &S,
        n: usize,
        order: Order,
        collection: &str,
    ) -> Result<Most> {
        let ranking = self.compare(query, scorer, order, collection)?;
        select_top(&ranking, n, collection)
    }
}

/// Ranks the live rows of `rows` against `query`.
///
/// Rows with no live entries skip the scorer entirely.
///
/// # Errors
///
/// Returns [`Error::ScoringFailed`] if the scorer errors, returns a score
/// count different from the row count, or returns NaN for a live row.
pub fn rank<S: Scorer + ?Sized>(
    query: &[f32],
    mut rows: Matrix,
    scorer: &S,
    order: Order,
) -> Result<Ranking> {
    let tombstoned = rows.tombstoned_indices();
    if tombstoned.len() == rows.rows() {
        return Ok(Ranking::default());
    }

    let mut live = vec![true; rows.rows()];
    for &index in &tombstoned {
        live[index] = false;
        if let Some(row) = rows.row_mut(index) {
            row.fill(0.0);
        }
    }

    let scores = scorer
        .score(query, &rows)
        .map_err(|e| Error::ScoringFailed {
            cause: format!("{e:#}"),
        })?;
    if scores.len() != rows.rows() {
        return Err(Error::ScoringFailed {
            cause: format!(
                "scorer returned {} scores for {} rows",
                scores.len(),
                rows.rows()
            ),
        });
    }

    let mut ranked = Vec::with_capacity(rows.rows() - tombstoned.len());
    for (index, score) in scores.into_iter().enumerate() {
        if !live[index] {
            continue;
        }
        if score.is_nan() {
            return Err(Error::ScoringFailed {
                cause: format!("scorer returned NaN for row {index}"),
            });
        }
        ranked.push((index, score));
    }

    Ok(Ranking::from_scores(ranked, order))
}

/// Takes the first `n` indices of a ranking.
///
/// # Errors
///
/// Returns [`Error::NoLiveRows`] when `n = 1` and the ranking is empty.
pub fn select_top(ranking: &Ranking, n: usize, collection: &str) -> Result<Most> {
    if n == 1 {
        return ranking
            .first()
            .map(|entry| Most::One(entry.index))
            .ok_or_else(|| Error::NoLiveRows(collection.to_string()));
    }
    Ok(Most::Many(ranking.top(n)))
}
