use crate::common::StratusConfig;
use crate::errors::StratusResult;
use crate::store::{BlobStore, BlobStoreProvider, InMemoryBlobStore};
use crate::stratus::Stratus;
use std::sync::Arc;

/// Builder for initializing a [`Stratus`] engine.
///
/// # Examples
///
/// ```rust,ignore
/// use stratus::{Stratus, StratusConfig};
///
/// // In-memory engine with default configuration
/// let db = Stratus::builder().open_in_memory()?;
///
/// // Custom retry policy over a provided store
/// let db = Stratus::builder()
///     .config(StratusConfig::new().max_catalog_retries(3))
///     .open_or_create(store)?;
/// ```
pub struct StratusBuilder {
    config: StratusConfig,
}

impl StratusBuilder {
    pub fn new() -> Self {
        StratusBuilder {
            config: StratusConfig::new(),
        }
    }

    /// Overrides the engine configuration.
    pub fn config(mut self, config: StratusConfig) -> Self {
        self.config = config;
        self
    }

    /// Opens an engine over the given blob store.
    pub fn open_or_create(self, store: BlobStore) -> StratusResult<Stratus> {
        Stratus::open(store, self.config)
    }

    /// Opens an engine over a provider implementation.
    pub fn open_with_provider(self, provider: Arc<dyn BlobStoreProvider>) -> StratusResult<Stratus> {
        Stratus::open(BlobStore::new(provider), self.config)
    }

    /// Opens an engine over a fresh in-memory store.
    pub fn open_in_memory(self) -> StratusResult<Stratus> {
        self.open_with_provider(Arc::new(InMemoryBlobStore::new()))
    }
}

impl Default for StratusBuilder {
    fn default() -> Self {
        Self::new()
    }
}
