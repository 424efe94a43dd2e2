//! Query parsing and in-memory predicate evaluation.
//!
//! The external dialect is document-shaped: a predicate object maps field
//! names to either a scalar (implicit equality) or a nested object of
//! `$`-prefixed operator clauses. Internally a query is a flat conjunction
//! of [`FieldCondition`]s over the closed [`QueryOp`] sum.

mod condition;
mod evaluator;
mod parser;

pub use condition::{FieldCondition, QueryOp};
pub use evaluator::matches_document;
pub use parser::parse_query;
