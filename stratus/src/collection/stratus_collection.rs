use crate::collection::document::Document;
use crate::collection::find_options::FindOptions;
use crate::collection::operation::{OperationContext, ReadOperations, WriteOperations};
use crate::errors::StratusResult;
use crate::index::{CatalogManager, IndexCatalog, IndexOptions};
use crate::store::BlobStore;
use serde_json::Value;
use std::sync::Arc;

/// A handle to a named collection of documents.
///
/// # Purpose
/// `StratusCollection` is the public surface of the query/index engine for
/// one collection: document CRUD, querying with pagination, and index
/// management. Handles are cheap to clone; all clones share the same
/// underlying state.
///
/// # Examples
///
/// ```rust,ignore
/// let users = db.collection("users")?;
/// users.create_index(&["email"], &unique_index())?;
/// users.create(doc! {"email": "a@b", "name": "Ann"})?;
/// let hits = users.find(&json!({"name": "Ann"}), &FindOptions::new())?;
/// ```
#[derive(Clone)]
pub struct StratusCollection {
    inner: Arc<CollectionInner>,
}

struct CollectionInner {
    name: String,
    container: String,
    catalogs: CatalogManager,
    read_ops: ReadOperations,
    write_ops: WriteOperations,
}

impl StratusCollection {
    pub(crate) fn new(
        name: &str,
        container: &str,
        store: BlobStore,
        catalogs: CatalogManager,
    ) -> Self {
        let ctx = Arc::new(OperationContext {
            container: container.to_string(),
            store,
            catalogs: catalogs.clone(),
        });
        StratusCollection {
            inner: Arc::new(CollectionInner {
                name: name.to_string(),
                container: container.to_string(),
                catalogs,
                read_ops: ReadOperations::new(ctx.clone()),
                write_ops: WriteOperations::new(ctx),
            }),
        }
    }

    /// The collection name as supplied by the caller.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The sanitized container identifier backing this collection.
    pub fn container_name(&self) -> &str {
        &self.inner.container
    }

    /// Creates a document under a freshly minted, time-ordered identifier.
    ///
    /// Returns the stored document with its `id` field populated.
    pub fn create(&self, document: Document) -> StratusResult<Document> {
        self.inner.write_ops.create(document, None)
    }

    /// Creates a document under a caller-supplied identifier.
    ///
    /// # Errors
    /// Fails with a unique-constraint violation when a document with the id
    /// already exists, or when a unique field value is already taken.
    pub fn create_with_id(&self, id: &str, document: Document) -> StratusResult<Document> {
        self.inner.write_ops.create(document, Some(id.to_string()))
    }

    /// Reads a document by id.
    ///
    /// # Errors
    /// Fails with `NotFound` when the document does not exist.
    pub fn read(&self, id: &str) -> StratusResult<Document> {
        self.inner.read_ops.get_by_id(id)
    }

    /// Replaces a document wholesale.
    ///
    /// # Errors
    /// Fails with `NotFound` when the document does not exist, or with a
    /// unique-constraint violation when a changed unique value is taken.
    pub fn update(&self, id: &str, document: Document) -> StratusResult<Document> {
        self.inner.write_ops.update(id, document)
    }

    /// Deletes a document by id. Deleting a missing document is a no-op.
    pub fn delete(&self, id: &str) -> StratusResult<()> {
        self.inner.write_ops.delete(id)
    }

    /// Finds documents matching a document-shaped predicate.
    ///
    /// An empty predicate enumerates the whole collection in listing order.
    /// Results follow the order of the underlying listing or tag search.
    pub fn find(&self, query: &Value, options: &FindOptions) -> StratusResult<Vec<Document>> {
        self.inner.read_ops.find(query, options)
    }

    /// Counts documents matching a predicate.
    pub fn count(&self, query: &Value) -> StratusResult<usize> {
        self.inner.read_ops.count(query)
    }

    /// Adds or updates an index over the given fields.
    ///
    /// A single field updates the collection's tag projection; multiple
    /// fields additionally record a compound definition. Index creation is
    /// idempotent and safe against concurrent callers.
    pub fn create_index(&self, fields: &[&str], options: &IndexOptions) -> StratusResult<()> {
        let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        self.inner
            .catalogs
            .create_index(&self.inner.container, &fields, options)?;
        Ok(())
    }

    /// Removes an index over the given fields.
    pub fn drop_index(&self, fields: &[&str]) -> StratusResult<()> {
        let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        self.inner
            .catalogs
            .drop_index(&self.inner.container, &fields)?;
        Ok(())
    }

    /// Returns the collection's current index catalog, freshly loaded from
    /// the store.
    pub fn list_indexes(&self) -> StratusResult<IndexCatalog> {
        self.inner.catalogs.refresh(&self.inner.container)
    }
}
