//! Data models for vecdb.
//!
//! Row-major matrices, tombstone helpers, and ranked comparison results.

mod matrix;
mod ranking;

pub use matrix::{Matrix, is_tombstone, tombstone_row};
pub use ranking::{Most, Order, Ranking, Scored};
