//! Index catalog management.
//!
//! A collection's index metadata lives in a single `__collection_indexes`
//! blob inside its container, mutated under optimistic concurrency (entity
//! tag compare-and-swap with bounded retry). The catalog decides which
//! document fields materialize as searchable blob tags and which of those
//! carry a unique constraint.

mod catalog;
mod catalog_manager;
mod options;

pub use catalog::{CompoundIndex, IndexCatalog};
pub use catalog_manager::CatalogManager;
pub use options::{hashed_unique_index, non_unique_index, unique_index, IndexOptions};
