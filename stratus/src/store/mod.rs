//! Storage backend abstractions.
//!
//! The engine talks to an abstract object store: containers of blobs, each
//! blob carrying content, an entity tag, and a searchable tag map. The
//! [`BlobStoreProvider`] trait is the contract a concrete SDK adapter
//! implements; [`InMemoryBlobStore`] is the in-process reference backend.

mod blob_store;
pub mod memory;

pub use blob_store::{BlobData, BlobStore, BlobStoreProvider, NameStream, PutOptions, PutResult};
pub use memory::InMemoryBlobStore;
