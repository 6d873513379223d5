//! Ranked comparison results.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Sort direction for a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    /// Highest score first (similarities).
    #[default]
    Descending,
    /// Lowest score first (distances).
    Ascending,
}

impl Order {
    /// Returns the order as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Descending => "desc",
            Self::Ascending => "asc",
        }
    }

    /// Parses an order from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "desc" | "descending" => Some(Self::Descending),
            "asc" | "ascending" => Some(Self::Ascending),
            _ => None,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A row index paired with its score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scored {
    /// Row index within the collection.
    pub index: usize,
    /// Score returned by the scorer.
    pub score: f32,
}

/// Live rows of a collection ordered by score.
///
/// Ties keep ascending index order. Tombstoned rows are never present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ranking {
    entries: Vec<Scored>,
}

impl Ranking {
    /// Sorts `(index, score)` pairs.
    ///
    /// The input is expected in ascending index order; the sort is stable,
    /// so equal scores stay in that order. `-0.0` and `0.0` compare equal.
    #[must_use]
    pub fn from_scores(scores: impl IntoIterator<Item = (usize, f32)>, order: Order) -> Self {
        let mut entries: Vec<Scored> = scores
            .into_iter()
            .map(|(index, score)| Scored { index, score })
            .collect();
        let by_score = |a: &Scored, b: &Scored| {
            a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal)
        };
        match order {
            Order::Descending => entries.sort_by(|a, b| by_score(b, a)),
            Order::Ascending => entries.sort_by(by_score),
        }
        Self { entries }
    }

    /// Number of ranked rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no rows were ranked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in rank order.
    pub fn iter(&self) -> std::slice::Iter<'_, Scored> {
        self.entries.iter()
    }

    /// Row indices in rank order.
    #[must_use]
    pub fn indices(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.index).collect()
    }

    /// Score of a given row index, if it was ranked.
    #[must_use]
    pub fn score_of(&self, index: usize) -> Option<f32> {
        self.entries
            .iter()
            .find(|e| e.index == index)
            .map(|e| e.score)
    }

    /// The best-ranked entry.
    #[must_use]
    pub fn first(&self) -> Option<Scored> {
        self.entries.first().copied()
    }

    /// The first `n` indices in rank order (fewer if the ranking is shorter).
    #[must_use]
    pub fn top(&self, n: usize) -> Vec<usize> {
        self.entries.iter().take(n).map(|e| e.index).collect()
    }

    /// Consumes the ranking, returning its entries.
    #[must_use]
    pub fn into_vec(self) -> Vec<Scored> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Ranking {
    type Item = &'a Scored;
    type IntoIter = std::slice::Iter<'a, Scored>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Result of a top-`n` query.
///
/// `n = 1` yields a bare index; any other `n` yields a sequence. Serializes
/// as a number or an array respectively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Most {
    /// The single best index (`n = 1`).
    One(usize),
    /// The first `n` indices in rank order.
    Many(Vec<usize>),
}

impl Most {
    /// The best index, if any.
    #[must_use]
    pub fn first(&self) -> Option<usize> {
        match self {
            Self::One(index) => Some(*index),
            Self::Many(indices) => indices.first().copied(),
        }
    }

    /// Flattens into a sequence of indices.
    #[must_use]
    pub fn into_vec(self) -> Vec<usize> {
        match self {
            Self::One(index) => vec![index],
            Self::Many(indices) => indices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Order::Descending; "descending")]
    #[test_case(Order::Ascending; "ascending")]
    fn test_signed_zero_ties_keep_index_order(order: Order) {
        let ranking = Ranking::from_scores(vec![(0, -0.0), (1, 0.0)], order);
        assert_eq!(ranking.indices(), vec![0, 1]);

        let ranking = Ranking::from_scores(vec![(0, 0.0), (1, -0.0), (2, 1.0)], order);
        let expected = match order {
            Order::Descending => vec![2, 0, 1],
            Order::Ascending => vec![0, 1, 2],
        };
        assert_eq!(ranking.indices(), expected);
    }

    #[test]
    fn test_descending_with_ties_keeps_index_order() {
        let ranking = Ranking::from_scores(
            vec![(0, 0.5), (1, 0.9), (2, 0.5), (3, 0.1)],
            Order::Descending,
        );
        assert_eq!(ranking.indices(), vec![1, 0, 2, 3]);
    }

    #[test]
    fn test_ascending() {
        let ranking = Ranking::from_scores(vec![(0, 3.0), (2, 1.0), (5, 2.0)], Order::Ascending);
        assert_eq!(ranking.indices(), vec![2, 5, 0]);
        assert_eq!(ranking.score_of(5), Some(2.0));
        assert_eq!(ranking.score_of(1), None);
    }

    #[test]
    fn test_top_truncates() {
        let ranking = Ranking::from_scores(vec![(0, 1.0), (1, 2.0)], Order::Descending);
        assert_eq!(ranking.top(5), vec![1, 0]);
        assert_eq!(ranking.top(1), vec![1]);
        assert!(ranking.top(0).is_empty());
    }

    #[test_case("desc", Some(Order::Descending))]
    #[test_case("Ascending", Some(Order::Ascending))]
    #[test_case("asc", Some(Order::Ascending))]
    #[test_case("sideways", None)]
    fn test_order_parse(input: &str, expected: Option<Order>) {
        assert_eq!(Order::parse(input), expected);
    }

    #[test]
    fn test_most_serializes_asymmetrically() {
        let one = serde_json::to_string(&Most::One(3)).expect("serialize");
        assert_eq!(one, "3");
        let many = serde_json::to_string(&Most::Many(vec![3, 1])).expect("serialize");
        assert_eq!(many, "[3,1]");
    }

    #[test]
    fn test_ranking_serializes_as_list() {
        let ranking = Ranking::from_scores(vec![(0, 1.0)], Order::Descending);
        let json = serde_json::to_string(&ranking).expect("serialize");
        assert_eq!(json, r#"[{"index":0,"score":1.0}]"#);
    }
}
