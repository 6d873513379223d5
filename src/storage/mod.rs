//! Storage layer.
//!
//! - **Container**: named, row-resizable 2-D `f32` arrays ([`ArrayBackend`])
//! - **Dataset**: store / get / update / delete with tombstone deletion

// Offsets are u64 on disk; row counts and widths never approach the
// precision limits these lints warn about.
#![allow(clippy::cast_possible_truncation)]
// Allow significant_drop_tightening - lock guards live for one short call.
#![allow(clippy::significant_drop_tightening)]

pub mod container;
mod dataset;
mod metrics;
pub mod traits;

pub use container::{FileContainer, MemoryContainer};
pub use dataset::{Collection, DEFAULT_COLLECTION, DEFAULT_PATH, DatasetStore, VecDb};
pub use traits::ArrayBackend;
