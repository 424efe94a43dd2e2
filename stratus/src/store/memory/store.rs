use crate::errors::{ErrorKind, StratusError, StratusResult};
use crate::store::memory::filter::{matches_tags, parse_tag_filter};
use crate::store::{BlobData, BlobStoreProvider, NameStream, PutOptions, PutResult};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Clone)]
struct StoredBlob {
    bytes: Vec<u8>,
    etag: String,
    tags: BTreeMap<String, String>,
}

type Container = Arc<RwLock<BTreeMap<String, StoredBlob>>>;

/// In-memory implementation of the blob-store contract.
///
/// # Purpose
/// A reference substrate for tests and ephemeral use. It reproduces the
/// semantics the engine relies on from a real object store: entity-tag
/// preconditions on writes, byte-lexicographic listing order, and
/// server-side evaluation of the conjunctive tag-filter grammar.
///
/// # Characteristics
/// - **Thread-Safe**: containers live in a concurrent map; each container
///   is guarded by its own read-write lock so conditional writes are atomic
/// - **Ordered**: blobs are kept in a `BTreeMap`, so listings and tag
///   searches stream names in lexicographic order, the way a cloud listing
///   does
/// - **Versioned**: every write mints a fresh entity tag from a process-wide
///   counter
#[derive(Default)]
pub struct InMemoryBlobStore {
    containers: DashMap<String, Container>,
    etag_counter: AtomicU64,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        InMemoryBlobStore {
            containers: DashMap::new(),
            etag_counter: AtomicU64::new(1),
        }
    }

    fn next_etag(&self) -> String {
        format!("{:016x}", self.etag_counter.fetch_add(1, Ordering::Relaxed))
    }

    fn container(&self, container: &str) -> StratusResult<Container> {
        match self.containers.get(container) {
            Some(entry) => Ok(entry.clone()),
            None => {
                log::error!("Container {} does not exist", container);
                Err(StratusError::new(
                    &format!("Container {} does not exist", container),
                    ErrorKind::BackendError,
                ))
            }
        }
    }
}

impl BlobStoreProvider for InMemoryBlobStore {
    fn ensure_container(&self, container: &str) -> StratusResult<()> {
        self.containers
            .entry(container.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(BTreeMap::new())));
        Ok(())
    }

    fn put(
        &self,
        container: &str,
        name: &str,
        bytes: &[u8],
        options: &PutOptions,
    ) -> StratusResult<PutResult> {
        let container = self.container(container)?;
        let mut blobs = container.write();

        let existing = blobs.get(name);
        if options.if_none_match_any && existing.is_some() {
            return Err(StratusError::new(
                &format!("Blob {} already exists", name),
                ErrorKind::Conflict,
            ));
        }
        if let Some(required) = &options.if_match {
            match existing {
                Some(blob) if &blob.etag == required => {}
                _ => {
                    return Err(StratusError::new(
                        &format!("Entity tag precondition failed for blob {}", name),
                        ErrorKind::Conflict,
                    ));
                }
            }
        }

        let etag = self.next_etag();
        blobs.insert(
            name.to_string(),
            StoredBlob {
                bytes: bytes.to_vec(),
                etag: etag.clone(),
                tags: options.tags.clone(),
            },
        );
        Ok(PutResult { etag })
    }

    fn get(&self, container: &str, name: &str) -> StratusResult<Option<BlobData>> {
        let container = match self.containers.get(container) {
            Some(entry) => entry.clone(),
            None => return Ok(None),
        };
        let blobs = container.read();
        Ok(blobs.get(name).map(|blob| BlobData {
            bytes: blob.bytes.clone(),
            etag: blob.etag.clone(),
        }))
    }

    fn exists(&self, container: &str, name: &str) -> StratusResult<bool> {
        let container = match self.containers.get(container) {
            Some(entry) => entry.clone(),
            None => return Ok(false),
        };
        let blobs = container.read();
        Ok(blobs.contains_key(name))
    }

    fn delete(&self, container: &str, name: &str) -> StratusResult<()> {
        if let Some(entry) = self.containers.get(container) {
            let container = entry.clone();
            let mut blobs = container.write();
            blobs.remove(name);
        }
        Ok(())
    }

    fn list(&self, container: &str, prefix: Option<&str>) -> StratusResult<NameStream> {
        let names: Vec<String> = match self.containers.get(container) {
            Some(entry) => {
                let container = entry.clone();
                let blobs = container.read();
                blobs
                    .keys()
                    .filter(|name| prefix.map_or(true, |p| name.starts_with(p)))
                    .cloned()
                    .collect()
            }
            None => Vec::new(),
        };
        Ok(Box::new(names.into_iter().map(Ok)))
    }

    fn find_by_tags(&self, container: &str, expr: &str) -> StratusResult<NameStream> {
        let predicates = parse_tag_filter(expr)?;
        let names: Vec<String> = match self.containers.get(container) {
            Some(entry) => {
                let container = entry.clone();
                let blobs = container.read();
                blobs
                    .iter()
                    .filter(|(_, blob)| matches_tags(&predicates, &blob.tags))
                    .map(|(name, _)| name.clone())
                    .collect()
            }
            None => Vec::new(),
        };
        Ok(Box::new(names.into_iter().map(Ok)))
    }

    fn drop_container(&self, container: &str) -> StratusResult<()> {
        self.containers.remove(container);
        Ok(())
    }

    fn list_containers(&self) -> StratusResult<Vec<String>> {
        let mut names: Vec<String> = self
            .containers
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemoryBlobStore {
        let store = InMemoryBlobStore::new();
        store.ensure_container("bucket").unwrap();
        store
    }

    fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_put_and_get_round_trip() {
        let store = store();
        let result = store
            .put("bucket", "doc-1", b"payload", &PutOptions::new())
            .unwrap();
        let blob = store.get("bucket", "doc-1").unwrap().unwrap();
        assert_eq!(blob.bytes, b"payload");
        assert_eq!(blob.etag, result.etag);
    }

    #[test]
    fn test_get_missing_returns_none() {
        let store = store();
        assert!(store.get("bucket", "nope").unwrap().is_none());
        assert!(store.get("missing-container", "nope").unwrap().is_none());
    }

    #[test]
    fn test_put_to_missing_container_fails() {
        let store = InMemoryBlobStore::new();
        let result = store.put("ghost", "doc", b"x", &PutOptions::new());
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::BackendError);
    }

    #[test]
    fn test_etags_change_on_overwrite() {
        let store = store();
        let first = store.put("bucket", "doc", b"v1", &PutOptions::new()).unwrap();
        let second = store.put("bucket", "doc", b"v2", &PutOptions::new()).unwrap();
        assert_ne!(first.etag, second.etag);
    }

    #[test]
    fn test_if_none_match_any() {
        let store = store();
        let options = PutOptions::new().if_none_match_any();
        assert!(store.put("bucket", "doc", b"v1", &options).is_ok());
        let result = store.put("bucket", "doc", b"v2", &options);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::Conflict);
    }

    #[test]
    fn test_if_match_succeeds_on_current_etag() {
        let store = store();
        let put = store.put("bucket", "doc", b"v1", &PutOptions::new()).unwrap();
        let options = PutOptions::new().if_match(&put.etag);
        assert!(store.put("bucket", "doc", b"v2", &options).is_ok());
    }

    #[test]
    fn test_if_match_fails_on_stale_etag() {
        let store = store();
        let put = store.put("bucket", "doc", b"v1", &PutOptions::new()).unwrap();
        store.put("bucket", "doc", b"v2", &PutOptions::new()).unwrap();
        let options = PutOptions::new().if_match(&put.etag);
        let result = store.put("bucket", "doc", b"v3", &options);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::Conflict);
    }

    #[test]
    fn test_if_match_fails_on_missing_blob() {
        let store = store();
        let options = PutOptions::new().if_match("0000000000000001");
        let result = store.put("bucket", "ghost", b"v1", &options);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::Conflict);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = store();
        store.put("bucket", "doc", b"v1", &PutOptions::new()).unwrap();
        assert!(store.delete("bucket", "doc").is_ok());
        assert!(store.delete("bucket", "doc").is_ok());
        assert!(store.delete("missing-container", "doc").is_ok());
        assert!(!store.exists("bucket", "doc").unwrap());
    }

    #[test]
    fn test_list_is_lexicographic() {
        let store = store();
        for name in ["b", "a", "c"] {
            store.put("bucket", name, b"x", &PutOptions::new()).unwrap();
        }
        let names: Vec<String> = store
            .list("bucket", None)
            .unwrap()
            .collect::<StratusResult<_>>()
            .unwrap();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_list_with_prefix() {
        let store = store();
        for name in ["doc-1", "doc-2", "other"] {
            store.put("bucket", name, b"x", &PutOptions::new()).unwrap();
        }
        let names: Vec<String> = store
            .list("bucket", Some("doc-"))
            .unwrap()
            .collect::<StratusResult<_>>()
            .unwrap();
        assert_eq!(names, vec!["doc-1", "doc-2"]);
    }

    #[test]
    fn test_find_by_tags() {
        let store = store();
        store
            .put(
                "bucket",
                "doc-1",
                b"x",
                &PutOptions::new().with_tags(tags(&[("city", "NYC"), ("age", "30")])),
            )
            .unwrap();
        store
            .put(
                "bucket",
                "doc-2",
                b"x",
                &PutOptions::new().with_tags(tags(&[("city", "LA"), ("age", "30")])),
            )
            .unwrap();

        let names: Vec<String> = store
            .find_by_tags("bucket", "\"city\" = 'NYC'")
            .unwrap()
            .collect::<StratusResult<_>>()
            .unwrap();
        assert_eq!(names, vec!["doc-1"]);

        let names: Vec<String> = store
            .find_by_tags("bucket", "\"age\" = '30'")
            .unwrap()
            .collect::<StratusResult<_>>()
            .unwrap();
        assert_eq!(names, vec!["doc-1", "doc-2"]);

        let names: Vec<String> = store
            .find_by_tags("bucket", "\"age\" = '30' AND \"city\" = 'LA'")
            .unwrap()
            .collect::<StratusResult<_>>()
            .unwrap();
        assert_eq!(names, vec!["doc-2"]);
    }

    #[test]
    fn test_find_by_tags_missing_container_is_empty() {
        let store = InMemoryBlobStore::new();
        let names: Vec<String> = store
            .find_by_tags("ghost", "\"a\" = 'b'")
            .unwrap()
            .collect::<StratusResult<_>>()
            .unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn test_drop_container() {
        let store = store();
        store.put("bucket", "doc", b"x", &PutOptions::new()).unwrap();
        store.drop_container("bucket").unwrap();
        assert!(store.get("bucket", "doc").unwrap().is_none());
        assert!(store.drop_container("bucket").is_ok());
    }

    #[test]
    fn test_list_containers() {
        let store = InMemoryBlobStore::new();
        store.ensure_container("beta").unwrap();
        store.ensure_container("alpha").unwrap();
        assert_eq!(store.list_containers().unwrap(), vec!["alpha", "beta"]);
    }
}
