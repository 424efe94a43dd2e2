//! Document collections and their operations.

pub(crate) mod document;
mod find_options;
pub(crate) mod operation;
mod stratus_collection;

pub use document::Document;
pub use find_options::{limit_to, skip_by, FindOptions};
pub use stratus_collection::StratusCollection;
