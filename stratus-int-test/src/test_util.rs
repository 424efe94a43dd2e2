use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use stratus::common::CATALOG_BLOB_NAME;
use stratus::errors::{ErrorKind, StratusError, StratusResult};
use stratus::store::{
    BlobData, BlobStore, BlobStoreProvider, InMemoryBlobStore, NameStream, PutOptions, PutResult,
};
use stratus::Stratus;

/// Runs a test with explicit setup and teardown.
///
/// The teardown runs whether or not the test body succeeds; the first error
/// encountered is reported with its full cause chain.
pub fn run_test<B, T, A>(before: B, test: T, after: A)
where
    B: Fn() -> StratusResult<TestContext>,
    T: Fn(TestContext) -> StratusResult<()>,
    A: Fn(TestContext) -> StratusResult<()>,
{
    let ctx = match before() {
        Ok(ctx) => ctx,
        Err(err) => panic!("Before run failed: {:?}", err),
    };

    let outcome = test(ctx.clone());
    let teardown = after(ctx);

    if let Err(err) = outcome {
        panic!("Test failed: {:?}", err);
    }
    if let Err(err) = teardown {
        panic!("After run failed: {:?}", err);
    }
}

/// The environment a test runs against: an engine over a fresh in-memory
/// store.
#[derive(Clone)]
pub struct TestContext {
    db: Stratus,
    store: Arc<InMemoryBlobStore>,
}

impl TestContext {
    pub fn db(&self) -> &Stratus {
        &self.db
    }

    /// A second engine over the same store, simulating another process with
    /// its own catalog cache.
    pub fn second_engine(&self) -> StratusResult<Stratus> {
        Stratus::builder().open_with_provider(self.store.clone())
    }

    /// Direct access to the underlying store, for assertions on blobs and
    /// tags.
    pub fn raw_store(&self) -> BlobStore {
        BlobStore::new(self.store.clone())
    }
}

/// Creates a test context over a fresh in-memory store.
pub fn create_test_context() -> StratusResult<TestContext> {
    let store = Arc::new(InMemoryBlobStore::new());
    let db = Stratus::builder().open_with_provider(store.clone())?;
    Ok(TestContext { db, store })
}

/// Drops every collection the test created.
pub fn cleanup(ctx: TestContext) -> StratusResult<()> {
    for container in ctx.db().list_collections()? {
        ctx.db().drop_collection(&container)?;
    }
    Ok(())
}

/// A store decorator that fails the first N catalog writes with a conflict,
/// used to exercise the catalog retry protocol end to end.
pub struct ConflictingCatalogStore {
    inner: InMemoryBlobStore,
    failures_left: AtomicU32,
}

impl ConflictingCatalogStore {
    pub fn new(failures: u32) -> Self {
        ConflictingCatalogStore {
            inner: InMemoryBlobStore::new(),
            failures_left: AtomicU32::new(failures),
        }
    }
}

impl BlobStoreProvider for ConflictingCatalogStore {
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
                    "Simulated catalog precondition failure",
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
