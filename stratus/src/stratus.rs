use crate::collection::StratusCollection;
use crate::common::{sanitize_container_name, StratusConfig};
use crate::errors::StratusResult;
use crate::index::CatalogManager;
use crate::store::BlobStore;
use crate::stratus_builder::StratusBuilder;
use dashmap::DashMap;
use std::sync::Arc;

/// The Stratus database engine.
///
/// # Purpose
/// `Stratus` owns the store handle, the engine configuration, the
/// process-wide index catalog cache, and the registry of open collection
/// handles. It is the entry point for everything else: collections are
/// obtained from it, and container lifecycle operations go through it.
///
/// # Design Pattern
/// The engine uses the pointer-to-implementation pattern: the public struct
/// is a thin `Arc` wrapper, so clones are cheap and all clones share the
/// same underlying state. The engine is `Send + Sync` and safe to share
/// across threads.
///
/// # Examples
///
/// ```rust,ignore
/// use stratus::Stratus;
///
/// let db = Stratus::builder().open_in_memory()?;
/// let users = db.collection("users")?;
/// users.create(doc! {"name": "Ann"})?;
/// ```
#[derive(Clone)]
pub struct Stratus {
    inner: Arc<StratusInner>,
}

struct StratusInner {
    store: BlobStore,
    catalogs: CatalogManager,
    collections: DashMap<String, StratusCollection>,
}

impl Stratus {
    /// Returns a builder for configuring and opening an engine.
    pub fn builder() -> StratusBuilder {
        StratusBuilder::new()
    }

    pub(crate) fn open(store: BlobStore, config: StratusConfig) -> StratusResult<Self> {
        let catalogs = CatalogManager::new(store.clone(), config);
        Ok(Stratus {
            inner: Arc::new(StratusInner {
                store,
                catalogs,
                collections: DashMap::new(),
            }),
        })
    }

    /// Opens a collection, creating its backing container when absent.
    ///
    /// The collection name is sanitized into a container identifier;
    /// distinct names can map to the same container (e.g. `"My Users"` and
    /// `"my-users"`), in which case they address the same collection.
    pub fn collection(&self, name: &str) -> StratusResult<StratusCollection> {
        let container = sanitize_container_name(name);
        if let Some(existing) = self.inner.collections.get(&container) {
            return Ok(existing.clone());
        }

        self.inner.store.ensure_container(&container)?;
        let collection = StratusCollection::new(
            name,
            &container,
            self.inner.store.clone(),
            self.inner.catalogs.clone(),
        );
        self.inner
            .collections
            .insert(container, collection.clone());
        Ok(collection)
    }

    /// Drops a collection: removes its container, documents, catalog blob,
    /// and the cached catalog entry. Dropping a missing collection is a
    /// no-op.
    pub fn drop_collection(&self, name: &str) -> StratusResult<()> {
        let container = sanitize_container_name(name);
        self.inner.store.drop_container(&container)?;
        self.inner.catalogs.evict(&container);
        self.inner.collections.remove(&container);
        log::debug!("Dropped collection {} (container {})", name, container);
        Ok(())
    }

    /// Lists the container identifiers of all collections in the store.
    pub fn list_collections(&self) -> StratusResult<Vec<String>> {
        self.inner.store.list_containers()
    }
}
