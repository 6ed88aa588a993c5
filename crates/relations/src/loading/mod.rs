//! Eager loading for sibling relations
//!
//! Fills the neighbor caches of a batch of parents with a fixed number of
//! queries, independent of the batch size.

pub mod siblings_loader;

pub use siblings_loader::{resolve_neighbors, BatchConfig, LoadReport, SiblingsLoader};
