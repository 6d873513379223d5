//! Property-based tests for store and ranking invariants.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Appends grow the row count by exactly the batch size
//! - Compare keys are exactly the live indices
//! - Rankings are ordered by score, ties by ascending index
//! - `most` agrees with the prefix of `compare`
//! - Indices are stable across deletes and later appends

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;
use std::collections::BTreeSet;
use vecdb::{DatasetStore, DotProduct, MemoryContainer, Most, Order, Ranking};

const DIMS: usize = 3;
const COLLECTION: &str = "props";

fn row() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-10.0f32..10.0, DIMS)
}

fn batch() -> impl Strategy<Value = Vec<Vec<f32>>> {
    prop::collection::vec(row(), 1..12)
}

fn populated(rows: &[Vec<f32>], deleted: &[usize]) -> DatasetStore<MemoryContainer> {
    let store = DatasetStore::in_memory(DIMS).expect("store");
    store.store(rows, COLLECTION).expect("populate");
    for &index in deleted {
        store.delete(index % rows.len(), COLLECTION).expect("delete");
    }
    store
}

fn order_strategy() -> impl Strategy<Value = Order> {
    prop_oneof![Just(Order::Descending), Just(Order::Ascending)]
}

proptest! {
    /// Property: each store call returns `previous_count + batch_len - 1`.
    #[test]
    fn prop_append_monotonic(batches in prop::collection::vec(batch(), 1..5)) {
        let store = DatasetStore::in_memory(DIMS).expect("store");
        let mut expected = 0usize;
        for rows in &batches {
            let last = store.store(rows, COLLECTION).expect("store");
            expected += rows.len();
            prop_assert_eq!(last, expected - 1);
            prop_assert_eq!(store.row_count(COLLECTION).expect("rows"), expected);
        }
    }

    /// Property: compare keys equal the live indices.
    #[test]
    fn prop_compare_excludes_tombstones(
        rows in batch(),
        deleted in prop::collection::vec(0usize..64, 0..8),
        query in row(),
    ) {
        let store = populated(&rows, &deleted);
        let ranking = store
            .compare(&query, &DotProduct, Order::Descending, COLLECTION)
            .expect("compare");

        let keys: BTreeSet<usize> = ranking.indices().into_iter().collect();
        let live: BTreeSet<usize> = (0..rows.len())
            .filter(|&i| !store.is_tombstone(i, COLLECTION).expect("tombstone"))
            .collect();
        prop_assert_eq!(keys.len(), ranking.len());
        prop_assert_eq!(keys, live);
    }

    /// Property: rankings are sorted by score, ties broken by ascending index.
    #[test]
    fn prop_ranking_ordered(rows in batch(), query in row(), order in order_strategy()) {
        let store = populated(&rows, &[]);
        let ranking = store
            .compare(&query, &DotProduct, order, COLLECTION)
            .expect("compare");

        let entries: Vec<_> = ranking.iter().collect();
        for pair in entries.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let in_order = match order {
                Order::Descending => a.score > b.score,
                Order::Ascending => a.score < b.score,
            };
            prop_assert!(in_order || (a.score == b.score && a.index < b.index));
        }
    }

    /// Property: scores that compare equal, signed zeros included, keep index order.
    #[test]
    fn prop_equal_scores_keep_index_order(
        scores in prop::collection::vec(prop::sample::select(vec![-0.0f32, 0.0, 1.0, -1.0]), 1..16),
        order in order_strategy(),
    ) {
        let ranking = Ranking::from_scores(scores.iter().copied().enumerate(), order);
        let entries: Vec<_> = ranking.iter().collect();
        for pair in entries.windows(2) {
            if pair[0].score == pair[1].score {
                prop_assert!(pair[0].index < pair[1].index);
            }
        }
    }

    /// Property: `most(n)` is the first `n` keys of `compare`.
    #[test]
    fn prop_most_matches_compare_prefix(
        rows in batch(),
        deleted in prop::collection::vec(0usize..64, 0..4),
        query in row(),
        n in 0usize..16,
    ) {
        let store = populated(&rows, &deleted);
        let ranking = store
            .compare(&query, &DotProduct, Order::Descending, COLLECTION)
            .expect("compare");
        let prefix: Vec<usize> = ranking.indices().into_iter().take(n).collect();

        match store.most(&query, &DotProduct, n, Order::Descending, COLLECTION) {
            Ok(Most::One(index)) => {
                prop_assert_eq!(n, 1);
                prop_assert_eq!(vec![index], prefix);
            },
            Ok(Most::Many(indices)) => {
                prop_assert_ne!(n, 1);
                prop_assert_eq!(indices, prefix);
            },
            Err(_) => prop_assert!(n == 1 && ranking.is_empty()),
        }
    }

    /// Property: deletes never move rows, and later appends never renumber them.
    #[test]
    fn prop_indices_stable(first in batch(), second in batch(), victim in 0usize..64) {
        let store = populated(&first, &[]);
        let victim = victim % first.len();
        store.delete(victim, COLLECTION).expect("delete");
        store.store(&second, COLLECTION).expect("append");

        for (i, expected) in first.iter().enumerate() {
            let stored = store.get(i, COLLECTION).expect("get");
            if i == victim {
                prop_assert!(stored.iter().all(|v| v.is_nan()));
            } else {
                prop_assert_eq!(&stored, expected);
            }
        }
        for (offset, expected) in second.iter().enumerate() {
            let stored = store.get(first.len() + offset, COLLECTION).expect("get");
            prop_assert_eq!(&stored, expected);
        }
    }
}
