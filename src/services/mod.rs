//! Services built on top of the dataset store.

mod similarity;

pub use similarity::{SimilarityService, rank, select_top};
