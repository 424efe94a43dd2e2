use crate::errors::StratusResult;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A lazy stream of blob names.
///
/// Items are `Result`s so a backend can surface a transient failure
/// mid-stream without tearing down the whole listing.
pub type NameStream = Box<dyn Iterator<Item = StratusResult<String>> + Send>;

/// Options for a conditional blob write.
#[derive(Clone, Debug, Default)]
pub struct PutOptions {
    /// Tags to attach to the blob, replacing any existing tag set.
    pub tags: BTreeMap<String, String>,
    /// Write only if the blob's current entity tag matches.
    pub if_match: Option<String>,
    /// Write only if no blob exists under the name (`If-None-Match: *`).
    pub if_none_match_any: bool,
}

impl PutOptions {
    pub fn new() -> Self {
        PutOptions::default()
    }

    /// Attaches a tag map to the write.
    pub fn with_tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    /// Makes the write conditional on the current entity tag.
    pub fn if_match(mut self, etag: &str) -> Self {
        self.if_match = Some(etag.to_string());
        self
    }

    /// Makes the write conditional on the blob not existing.
    pub fn if_none_match_any(mut self) -> Self {
        self.if_none_match_any = true;
        self
    }
}

/// A blob's content together with its current entity tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobData {
    pub bytes: Vec<u8>,
    pub etag: String,
}

/// The outcome of a successful blob write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutResult {
    pub etag: String,
}

/// Low-level contract for the object-store substrate.
///
/// # Purpose
/// Defines the operations the engine needs from a cloud blob store: container
/// lifecycle, conditional reads/writes with entity tags, per-object metadata
/// tags, prefix listing, and server-side tag search. Implementations adapt a
/// concrete SDK (or an in-memory stand-in) to this contract.
///
/// # Semantics
/// - `put` honors `if_match` / `if_none_match_any` preconditions and fails
///   with a [`Conflict`](crate::errors::ErrorKind::Conflict) error when a
///   precondition does not hold.
/// - `get` returns `Ok(None)` for a missing blob; absence is not an error at
///   this layer.
/// - `delete` is idempotent: deleting a missing blob succeeds silently.
/// - `find_by_tags` evaluates a conjunctive filter expression (the grammar
///   produced by the query planner) against blob tags, comparing values
///   byte-lexicographically.
///
/// # Thread Safety
/// Implementers must be `Send + Sync`; the engine shares one provider across
/// collections and threads.
pub trait BlobStoreProvider: Send + Sync {
    /// Creates the container when absent. Idempotent.
    fn ensure_container(&self, container: &str) -> StratusResult<()>;

    /// Writes a blob, replacing content and tags, subject to the options'
    /// preconditions. Returns the new entity tag.
    fn put(
        &self,
        container: &str,
        name: &str,
        bytes: &[u8],
        options: &PutOptions,
    ) -> StratusResult<PutResult>;

    /// Reads a blob's content and entity tag, or `None` when absent.
    fn get(&self, container: &str, name: &str) -> StratusResult<Option<BlobData>>;

    /// Checks whether a blob exists.
    fn exists(&self, container: &str, name: &str) -> StratusResult<bool>;

    /// Deletes a blob. Idempotent; deleting a missing blob is a no-op.
    fn delete(&self, container: &str, name: &str) -> StratusResult<()>;

    /// Lists blob names in the container in the store's natural (byte
    /// lexicographic) order, optionally restricted to a name prefix.
    fn list(&self, container: &str, prefix: Option<&str>) -> StratusResult<NameStream>;

    /// Evaluates a tag-filter expression server-side and streams the names
    /// of matching blobs.
    fn find_by_tags(&self, container: &str, expr: &str) -> StratusResult<NameStream>;

    /// Removes the container and everything in it. Idempotent.
    fn drop_container(&self, container: &str) -> StratusResult<()>;

    /// Lists the names of all containers.
    fn list_containers(&self) -> StratusResult<Vec<String>>;
}

/// A cloneable handle to a [`BlobStoreProvider`].
///
/// All clones share the same underlying provider. This is the type the
/// engine and collections hold; the provider trait stays object-safe behind
/// it.
#[derive(Clone)]
pub struct BlobStore {
    inner: Arc<dyn BlobStoreProvider>,
}

impl BlobStore {
    /// Wraps a provider implementation in a shareable handle.
    pub fn new(provider: Arc<dyn BlobStoreProvider>) -> Self {
        BlobStore { inner: provider }
    }

    pub fn ensure_container(&self, container: &str) -> StratusResult<()> {
        self.inner.ensure_container(container)
    }

    pub fn put(
        &self,
        container: &str,
        name: &str,
        bytes: &[u8],
        options: &PutOptions,
    ) -> StratusResult<PutResult> {
        self.inner.put(container, name, bytes, options)
    }

    pub fn get(&self, container: &str, name: &str) -> StratusResult<Option<BlobData>> {
        self.inner.get(container, name)
    }

    pub fn exists(&self, container: &str, name: &str) -> StratusResult<bool> {
        self.inner.exists(container, name)
    }

    pub fn delete(&self, container: &str, name: &str) -> StratusResult<()> {
        self.inner.delete(container, name)
    }

    pub fn list(&self, container: &str, prefix: Option<&str>) -> StratusResult<NameStream> {
        self.inner.list(container, prefix)
    }

    pub fn find_by_tags(&self, container: &str, expr: &str) -> StratusResult<NameStream> {
        self.inner.find_by_tags(container, expr)
    }

    pub fn drop_container(&self, container: &str) -> StratusResult<()> {
        self.inner.drop_container(container)
    }

    pub fn list_containers(&self) -> StratusResult<Vec<String>> {
        self.inner.list_containers()
    }
}
