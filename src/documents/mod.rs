//! Document storage - per-user/subject/category PDF trees on disk.

mod extract;
mod file_ops;
mod store;

pub use extract::{TextExtractor, annotate};
pub use store::DocumentStore;
