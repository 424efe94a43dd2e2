//! # Stratus - Document Database on Cloud Object Storage
//!
//! Stratus is a lightweight document database whose durable substrate is a
//! cloud object store: blob storage providing per-object metadata tags,
//! conditional writes via entity tags, and tag-based server-side search.
//!
//! ## Key Features
//!
//! - **Documents as blobs**: one UTF-8 JSON blob per document, mutated only
//!   by full replacement
//! - **Tag-driven indexing**: indexed fields materialize as searchable blob
//!   tags under a restricted alphabet, with order-preserving encodings for
//!   numbers and timestamps
//! - **Rich querying**: document-shaped predicates with `$eq`, `$gt`,
//!   `$gte`, `$lt`, `$lte`, `$in`, `$nin`, and `$between`
//! - **Adaptive execution**: server-side tag filters where the dialect can
//!   express the query, full scans with in-memory evaluation where it
//!   cannot, and hybrid plans in between
//! - **Unique constraints**: best-effort uniqueness enforced with tag
//!   probes at write time
//! - **Optimistic concurrency**: per-collection index catalogs mutated via
//!   entity-tag compare-and-swap with bounded retry
//! - **Pluggable substrate**: any object store implementing the provider
//!   contract; an in-memory reference backend ships in the crate
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stratus::collection::FindOptions;
//! use stratus::index::unique_index;
//! use stratus::{doc, Stratus};
//! use serde_json::json;
//!
//! # fn main() -> stratus::errors::StratusResult<()> {
//! let db = Stratus::builder().open_in_memory()?;
//!
//! let users = db.collection("users")?;
//! users.create_index(&["email"], &unique_index())?;
//!
//! users.create(doc! {"email": "ann@example.com", "age": 34})?;
//!
//! let hits = users.find(&json!({"age": {"$gte": 30}}), &FindOptions::new())?;
//! assert_eq!(hits.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`codec`] - Tag value encoding, decoding, and hashing
//! - [`collection`] - Collections, documents, and find options
//! - [`common`] - Shared types, constants, and utilities
//! - [`errors`] - Error types and result definitions
//! - [`index`] - Index catalogs and catalog management
//! - [`query`] - Query parsing and in-memory evaluation
//! - [`store`] - Storage substrate contract and in-memory backend
//! - [`stratus`] - Core engine interface
//! - [`stratus_builder`] - Engine builder for initialization

pub mod codec;
pub mod collection;
pub mod common;
pub mod errors;
pub mod index;
pub mod query;
pub mod store;
pub mod stratus;
pub mod stratus_builder;

pub use crate::stratus::Stratus;
pub use crate::stratus_builder::StratusBuilder;
