use crate::codec::{encode_tag_value, hash_tag_value};
use crate::collection::document::{validate_document_id, Document};
use crate::collection::operation::find_plan::equality_atom;
use crate::collection::operation::OperationContext;
use crate::common::{MAX_TAG_VALUE_LEN, SYSTEM_PREFIX};
use crate::errors::{ErrorKind, StratusError, StratusResult};
use crate::index::IndexCatalog;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Mutation path for a single collection.
///
/// Every write recomputes the document's tag projection from the current
/// catalog, probes unique fields with a server-side tag search, and puts
/// the blob with its tag map. The probe-then-write sequence is not
/// serializable against concurrent writers of the same unique value;
/// uniqueness is best-effort at write time.
#[derive(Clone)]
pub(crate) struct WriteOperations {
    ctx: Arc<OperationContext>,
}

impl WriteOperations {
    pub fn new(ctx: Arc<OperationContext>) -> Self {
        WriteOperations { ctx }
    }

    /// Creates a document under a caller-supplied or freshly minted id.
    ///
    /// Minted identifiers are time-ordered UUIDs, so creation order and
    /// listing order agree for generated ids.
    pub fn create(&self, mut document: Document, id: Option<String>) -> StratusResult<Document> {
        let id = match id {
            Some(id) => {
                validate_document_id(&id)?;
                id
            }
            None => Uuid::now_v7().to_string(),
        };
        document.set_id(&id);

        let catalog = self.ctx.catalogs.load(&self.ctx.container)?;
        let tags = self.build_tag_map(&document, &catalog);

        for field in catalog.unique_fields() {
            if let Some(tag) = tags.get(field) {
                self.probe_unique(field, tag, None)?;
            }
        }

        let options = crate::store::PutOptions::new()
            .with_tags(tags)
            .if_none_match_any();
        match self
            .ctx
            .store
            .put(&self.ctx.container, &id, &document.to_bytes()?, &options)
        {
            Ok(_) => Ok(document),
            Err(err) if err.kind() == &ErrorKind::Conflict => {
                log::error!("Document already exists with id {}", id);
                Err(StratusError::new_with_cause(
                    &format!("Document already exists with id {}", id),
                    ErrorKind::UniqueConstraintViolation,
                    err,
                ))
            }
            Err(err) => Err(err),
        }
    }

    /// Replaces a document wholesale.
    ///
    /// Unique fields are re-probed only when their encoded value changed,
    /// and the document's own id is excluded from the violation set.
    pub fn update(&self, id: &str, mut document: Document) -> StratusResult<Document> {
        validate_document_id(id)?;

        let existing = match self.ctx.store.get(&self.ctx.container, id)? {
            Some(blob) => Document::from_bytes(&blob.bytes)?,
            None => {
                log::error!("Cannot update missing document {} in {}", id, self.ctx.container);
                return Err(StratusError::new(
                    &format!("Document {} not found", id),
                    ErrorKind::NotFound,
                ));
            }
        };

        document.set_id(id);
        let catalog = self.ctx.catalogs.load(&self.ctx.container)?;
        let new_tags = self.build_tag_map(&document, &catalog);
        let old_tags = self.build_tag_map(&existing, &catalog);

        for field in catalog.unique_fields() {
            if let Some(tag) = new_tags.get(field) {
                if old_tags.get(field) != Some(tag) {
                    self.probe_unique(field, tag, Some(id))?;
                }
            }
        }

        let options = crate::store::PutOptions::new().with_tags(new_tags);
        self.ctx
            .store
            .put(&self.ctx.container, id, &document.to_bytes()?, &options)?;
        Ok(document)
    }

    /// Deletes a document by id. Removing a missing document succeeds
    /// silently.
    pub fn delete(&self, id: &str) -> StratusResult<()> {
        validate_document_id(id)?;
        self.ctx.store.delete(&self.ctx.container, id)
    }

    /// Materializes the indexed projection of a document as its tag map.
    ///
    /// A field that is missing or null is simply not tagged. A value with
    /// no tag encoding, or whose encoding exceeds the tag length limit, is
    /// skipped with a warning and the write continues without it.
    fn build_tag_map(
        &self,
        document: &Document,
        catalog: &IndexCatalog,
    ) -> BTreeMap<String, String> {
        let mut tags = BTreeMap::new();
        for field in catalog.indexed_fields() {
            let value = match document.get(field) {
                Some(value) if !value.is_null() => value,
                _ => continue,
            };

            let encoded = if catalog.is_hashed(field) {
                hash_tag_value(value)
            } else {
                encode_tag_value(value)
            };

            match encoded {
                Some(tag) if tag.len() <= MAX_TAG_VALUE_LEN => {
                    tags.insert(field.clone(), tag);
                }
                Some(_) => {
                    log::warn!(
                        "Skipping tag for field {} on {}: encoded value exceeds {} bytes",
                        field,
                        document.id().unwrap_or("<unset>"),
                        MAX_TAG_VALUE_LEN
                    );
                }
                None => {
                    log::warn!(
                        "Skipping tag for field {} on {}: value type has no tag encoding",
                        field,
                        document.id().unwrap_or("<unset>")
                    );
                }
            }
        }
        tags
    }

    /// Fails with a unique-constraint violation when any other document
    /// already carries the encoded value for the field.
    fn probe_unique(
        &self,
        field: &str,
        encoded: &str,
        exclude_id: Option<&str>,
    ) -> StratusResult<()> {
        let expr = equality_atom(field, encoded);
        let hits = self.ctx.store.find_by_tags(&self.ctx.container, &expr)?;
        for hit in hits {
            let name = hit?;
            if name.starts_with(SYSTEM_PREFIX) {
                continue;
            }
            if exclude_id == Some(name.as_str()) {
                continue;
            }
            log::error!(
                "Unique constraint violated on field {}: value already held by {}",
                field,
                name
            );
            return Err(StratusError::new(
                &format!("Unique constraint violated on field {}", field),
                ErrorKind::UniqueConstraintViolation,
            ));
        }
        Ok(())
    }
}
