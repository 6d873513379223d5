//! Storage traits.

mod array;

pub use array::ArrayBackend;
