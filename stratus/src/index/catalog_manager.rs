use crate::common::{LockRegistry, StratusConfig, CATALOG_BLOB_NAME};
use crate::errors::{ErrorKind, StratusError, StratusResult};
use crate::index::catalog::IndexCatalog;
use crate::index::options::IndexOptions;
use crate::store::{BlobStore, PutOptions};
use dashmap::DashMap;
use std::sync::Arc;

/// Owns the lifecycle of per-collection index catalogs.
///
/// # Purpose
/// The `__collection_indexes` blob is the only shared mutable resource the
/// engine owns. The manager mediates all access to it: a process-wide cache
/// keyed by container, conditional writes guarded by entity tags, and a
/// bounded retry loop that re-reads and re-applies a mutation when a
/// concurrent writer wins the compare-and-swap race.
///
/// # Concurrency
/// Within the process, catalog mutations on the same container serialize on
/// a named lock; across processes the entity-tag precondition is the only
/// arbiter. Readers may observe a stale cached catalog; a writer that loses
/// the CAS refreshes the cache before surfacing or retrying.
#[derive(Clone)]
pub struct CatalogManager {
    inner: Arc<CatalogManagerInner>,
}

struct CatalogManagerInner {
    store: BlobStore,
    config: StratusConfig,
    cache: DashMap<String, IndexCatalog>,
    locks: LockRegistry,
}

impl CatalogManager {
    pub fn new(store: BlobStore, config: StratusConfig) -> Self {
        CatalogManager {
            inner: Arc::new(CatalogManagerInner {
                store,
                config,
                cache: DashMap::new(),
                locks: LockRegistry::new(),
            }),
        }
    }

    /// Returns the catalog for a container, serving from the cache when
    /// possible. A container with no catalog blob yields an empty catalog
    /// with no entity tag.
    pub fn load(&self, container: &str) -> StratusResult<IndexCatalog> {
        if let Some(cached) = self.inner.cache.get(container) {
            return Ok(cached.clone());
        }
        self.refresh(container)
    }

    /// Fetches the catalog from the store, bypassing and repopulating the
    /// cache.
    pub fn refresh(&self, container: &str) -> StratusResult<IndexCatalog> {
        let catalog = match self.inner.store.get(container, CATALOG_BLOB_NAME)? {
            Some(blob) => {
                let mut catalog = IndexCatalog::from_bytes(&blob.bytes)?;
                catalog.set_etag(Some(blob.etag));
                catalog
            }
            None => IndexCatalog::empty(),
        };
        self.inner
            .cache
            .insert(container.to_string(), catalog.clone());
        Ok(catalog)
    }

    /// Writes a catalog conditionally: `If-Match` on the entity tag it was
    /// loaded with, or `If-None-Match: *` for a first write. On success the
    /// cache is updated with the new entity tag; on a precondition failure
    /// the cache is refreshed and a conflict is surfaced to the caller.
    pub fn save(&self, container: &str, catalog: &IndexCatalog) -> StratusResult<IndexCatalog> {
        let bytes = catalog.to_bytes()?;
        let options = match catalog.etag() {
            Some(etag) => PutOptions::new().if_match(etag),
            None => PutOptions::new().if_none_match_any(),
        };

        match self.inner.store.put(container, CATALOG_BLOB_NAME, &bytes, &options) {
            Ok(result) => {
                let mut saved = catalog.clone();
                saved.set_etag(Some(result.etag));
                self.inner
                    .cache
                    .insert(container.to_string(), saved.clone());
                Ok(saved)
            }
            Err(err) if err.kind() == &ErrorKind::Conflict => {
                log::warn!(
                    "Catalog write for container {} lost a CAS race, refreshing cache",
                    container
                );
                self.refresh(container)?;
                Err(StratusError::new_with_cause(
                    &format!("Catalog for container {} was modified concurrently", container),
                    ErrorKind::Conflict,
                    err,
                ))
            }
            Err(err) => Err(err),
        }
    }

    /// Adds or updates an index definition under the CAS retry protocol.
    ///
    /// Each attempt reloads the catalog and reapplies the mutation
    /// idempotently, so losing a race to a writer that already applied the
    /// same definition converges to a no-op. A tag-cap breach fails
    /// immediately and is never retried.
    pub fn create_index(
        &self,
        container: &str,
        fields: &[String],
        options: &IndexOptions,
    ) -> StratusResult<IndexCatalog> {
        self.mutate(container, |catalog| catalog.apply_index(fields, options))
    }

    /// Removes an index definition under the same CAS retry protocol as
    /// [`create_index`](Self::create_index).
    pub fn drop_index(&self, container: &str, fields: &[String]) -> StratusResult<IndexCatalog> {
        self.mutate(container, |catalog| catalog.remove_index(fields))
    }

    /// Evicts a container's cache entry and lock, after the container is
    /// dropped.
    pub fn evict(&self, container: &str) {
        self.inner.cache.remove(container);
        self.inner.locks.remove_lock(container);
    }

    fn mutate<F>(&self, container: &str, mutation: F) -> StratusResult<IndexCatalog>
    where
        F: Fn(&mut IndexCatalog) -> StratusResult<bool>,
    {
        // serialize in-process writers; the CAS below arbitrates the rest
        let lock = self.inner.locks.get_lock(container);
        let _guard = lock.lock();

        let max_retries = self.inner.config.max_catalog_retries;
        let mut attempt = 0u32;
        loop {
            let mut catalog = if attempt == 0 {
                self.load(container)?
            } else {
                self.refresh(container)?
            };

            let changed = mutation(&mut catalog)?;
            if !changed {
                return Ok(catalog);
            }

            match self.save(container, &catalog) {
                Ok(saved) => return Ok(saved),
                Err(err) if err.kind() == &ErrorKind::Conflict => {
                    if attempt >= max_retries {
                        log::error!(
                            "Catalog mutation for container {} failed after {} retries",
                            container,
                            max_retries
                        );
                        return Err(err);
                    }
                    let delay = self.inner.config.backoff_delay(attempt);
                    log::warn!(
                        "Retrying catalog mutation for container {} in {:?} (attempt {})",
                        container,
                        delay,
                        attempt + 1
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::options::{non_unique_index, unique_index};
    use crate::store::{BlobData, BlobStoreProvider, InMemoryBlobStore, NameStream, PutResult};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn manager() -> (CatalogManager, BlobStore) {
        let provider = Arc::new(InMemoryBlobStore::new());
        provider.ensure_container("users").unwrap();
        let store = BlobStore::new(provider);
        let manager = CatalogManager::new(store.clone(), StratusConfig::new());
        (manager, store)
    }

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_load_missing_catalog_is_empty() {
        let (manager, _) = manager();
        let catalog = manager.load("users").unwrap();
        assert!(catalog.indexed_fields().is_empty());
        assert!(catalog.etag().is_none());
    }

    #[test]
    fn test_create_index_persists_catalog() {
        let (manager, store) = manager();
        let catalog = manager
            .create_index("users", &fields(&["email"]), &unique_index())
            .unwrap();
        assert!(catalog.is_unique("email"));
        assert!(catalog.etag().is_some());

        // the blob is now on the store and a fresh manager sees it
        let blob = store.get("users", CATALOG_BLOB_NAME).unwrap().unwrap();
        let persisted = IndexCatalog::from_bytes(&blob.bytes).unwrap();
        assert!(persisted.is_unique("email"));
    }

    #[test]
    fn test_create_index_is_idempotent() {
        let (manager, store) = manager();
        manager
            .create_index("users", &fields(&["email"]), &unique_index())
            .unwrap();
        let etag_before = store.get("users", CATALOG_BLOB_NAME).unwrap().unwrap().etag;
        manager
            .create_index("users", &fields(&["email"]), &unique_index())
            .unwrap();
        let etag_after = store.get("users", CATALOG_BLOB_NAME).unwrap().unwrap().etag;
        // the second call was a no-op and did not rewrite the blob
        assert_eq!(etag_before, etag_after);
    }

    #[test]
    fn test_tag_cap_fails_without_retry_delay() {
        let (manager, _) = manager();
        for i in 0..10 {
            manager
                .create_index("users", &fields(&[&format!("f{}", i)]), &non_unique_index())
                .unwrap();
        }
        let start = std::time::Instant::now();
        let result = manager.create_index("users", &fields(&["f10"]), &non_unique_index());
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::ValidationError);
        // no backoff was taken for the permanent failure
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_concurrent_managers_converge_via_cas() {
        // two managers over the same store simulate two processes
        let provider = Arc::new(InMemoryBlobStore::new());
        provider.ensure_container("users").unwrap();
        let store = BlobStore::new(provider);
        let a = CatalogManager::new(store.clone(), StratusConfig::new());
        let b = CatalogManager::new(store.clone(), StratusConfig::new());

        a.create_index("users", &fields(&["age"]), &non_unique_index())
            .unwrap();
        // b's first load sees a's write only via the store; its own save
        // must retry through the CAS and land the union of both mutations
        let catalog = b
            .create_index("users", &fields(&["city"]), &non_unique_index())
            .unwrap();
        assert!(catalog.is_indexed("age"));
        assert!(catalog.is_indexed("city"));
    }

    #[test]
    fn test_stale_cache_retries_and_converges() {
        let provider = Arc::new(InMemoryBlobStore::new());
        provider.ensure_container("users").unwrap();
        let store = BlobStore::new(provider);
        let a = CatalogManager::new(store.clone(), StratusConfig::new());
        let b = CatalogManager::new(store.clone(), StratusConfig::new());

        // both caches warm on the empty catalog
        a.load("users").unwrap();
        b.load("users").unwrap();

        a.create_index("users", &fields(&["age"]), &non_unique_index())
            .unwrap();
        // b still holds the empty catalog; its first save conflicts, gets
        // refreshed, and the retry applies cleanly
        let catalog = b
            .create_index("users", &fields(&["city"]), &non_unique_index())
            .unwrap();
        assert!(catalog.is_indexed("age"));
        assert!(catalog.is_indexed("city"));
    }

    #[test]
    fn test_evict_forgets_cache() {
        let (manager, store) = manager();
        manager
            .create_index("users", &fields(&["age"]), &non_unique_index())
            .unwrap();
        manager.evict("users");
        // after eviction, a load re-reads the store
        store.delete("users", CATALOG_BLOB_NAME).unwrap();
        let catalog = manager.load("users").unwrap();
        assert!(catalog.indexed_fields().is_empty());
    }

    /// A store decorator that fails the first N catalog writes with a
    /// conflict, to exercise the retry loop deterministically.
    struct FlakyStore {
        inner: InMemoryBlobStore,
        failures_left: AtomicU32,
    }

    impl BlobStoreProvider for FlakyStore {
        fn ensure_container(&self, container: &str) -> StratusResult<()> {
            self.inner.ensure_container(container)
        }

        fn put(
            &self,
            container: &str,
            name: &str,
            bytes: &[u8],
            options: &PutOptions,
        ) -> StratusResult<PutResult> {
            if name == CATALOG_BLOB_NAME {
                let left = self.failures_left.load(Ordering::SeqCst);
                if left > 0 {
                    self.failures_left.store(left - 1, Ordering::SeqCst);
                    return Err(StratusError::new(
                        "Simulated precondition failure",
                        ErrorKind::Conflict,
                    ));
                }
            }
            self.inner.put(container, name, bytes, options)
        }

        fn get(&self, container: &str, name: &str) -> StratusResult<Option<BlobData>> {
            self.inner.get(container, name)
        }

        fn exists(&self, container: &str, name: &str) -> StratusResult<bool> {
            self.inner.exists(container, name)
        }

        fn delete(&self, container: &str, name: &str) -> StratusResult<()> {
            self.inner.delete(container, name)
        }

        fn list(&self, container: &str, prefix: Option<&str>) -> StratusResult<NameStream> {
            self.inner.list(container, prefix)
        }

        fn find_by_tags(&self, container: &str, expr: &str) -> StratusResult<NameStream> {
            self.inner.find_by_tags(container, expr)
        }

        fn drop_container(&self, container: &str) -> StratusResult<()> {
            self.inner.drop_container(container)
        }

        fn list_containers(&self) -> StratusResult<Vec<String>> {
            self.inner.list_containers()
        }
    }

    #[test]
    fn test_retry_recovers_from_transient_conflicts() {
        let flaky = Arc::new(FlakyStore {
            inner: InMemoryBlobStore::new(),
            failures_left: AtomicU32::new(3),
        });
        flaky.ensure_container("users").unwrap();
        let config = StratusConfig::new()
            .catalog_retry_initial_delay(Duration::from_millis(5))
            .catalog_retry_max_delay(Duration::from_millis(20));
        let manager = CatalogManager::new(BlobStore::new(flaky), config);

        let start = std::time::Instant::now();
        let catalog = manager
            .create_index("users", &fields(&["age"]), &non_unique_index())
            .unwrap();
        assert!(catalog.is_indexed("age"));
        // three failures burned 5 + 10 + 20 ms of backoff
        assert!(start.elapsed() >= Duration::from_millis(35));
    }

    #[test]
    fn test_conflict_surfaces_after_retries_exhausted() {
        let flaky = Arc::new(FlakyStore {
            inner: InMemoryBlobStore::new(),
            failures_left: AtomicU32::new(u32::MAX),
        });
        flaky.ensure_container("users").unwrap();
        let config = StratusConfig::new()
            .max_catalog_retries(2)
            .catalog_retry_initial_delay(Duration::from_millis(1))
            .catalog_retry_max_delay(Duration::from_millis(2));
        let manager = CatalogManager::new(BlobStore::new(flaky), config);

        let result = manager.create_index("users", &fields(&["age"]), &non_unique_index());
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::Conflict);
    }

    #[test]
    fn test_drop_index_persists() {
        let (manager, _) = manager();
        manager
            .create_index("users", &fields(&["age"]), &non_unique_index())
            .unwrap();
        let catalog = manager.drop_index("users", &fields(&["age"])).unwrap();
        assert!(!catalog.is_indexed("age"));

        // visible to a cold manager as well
        let provider_view = manager.refresh("users").unwrap();
        assert!(!provider_view.is_indexed("age"));
    }
}
