use crate::common::{COMPOUND_INDEX_SEPARATOR, MAX_INDEXED_FIELDS};
use crate::errors::{ErrorKind, StratusError, StratusResult};
use crate::index::options::IndexOptions;
use std::collections::{BTreeMap, BTreeSet};

/// A compound (multi-field) index definition.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct CompoundIndex {
    /// The indexed fields, in declaration order. `[a, b]` and `[b, a]` are
    /// distinct indexes.
    pub fields: Vec<String>,
    pub unique: bool,
}

/// Per-collection index metadata.
///
/// The catalog is the sole source of truth for which fields of a collection
/// are projected as blob tags; tags on document blobs are a derived
/// projection of it. It is persisted as a single JSON blob at the
/// well-known system name `__collection_indexes` inside the collection's
/// container, and mutated under optimistic concurrency: the entity tag of
/// the last read is carried out-of-band and used as an `If-Match`
/// precondition on save.
///
/// # Invariants
/// - `unique_fields ⊆ indexed_fields` (likewise `hashed_fields`)
/// - `indexed_fields` never exceeds the blob-tag cardinality limit
/// - compound definitions only reference fields present in `indexed_fields`
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexCatalog {
    indexed_fields: BTreeSet<String>,
    unique_fields: BTreeSet<String>,
    hashed_fields: BTreeSet<String>,
    indexes: BTreeMap<String, CompoundIndex>,
    #[serde(skip)]
    etag: Option<String>,
}

impl IndexCatalog {
    /// Creates an empty catalog with no entity tag, as returned for a
    /// collection that has never defined an index.
    pub fn empty() -> Self {
        IndexCatalog::default()
    }

    pub fn indexed_fields(&self) -> &BTreeSet<String> {
        &self.indexed_fields
    }

    pub fn unique_fields(&self) -> &BTreeSet<String> {
        &self.unique_fields
    }

    pub fn indexes(&self) -> &BTreeMap<String, CompoundIndex> {
        &self.indexes
    }

    pub fn is_indexed(&self, field: &str) -> bool {
        self.indexed_fields.contains(field)
    }

    pub fn is_unique(&self, field: &str) -> bool {
        self.unique_fields.contains(field)
    }

    pub fn is_hashed(&self, field: &str) -> bool {
        self.hashed_fields.contains(field)
    }

    /// The entity tag observed when this catalog was loaded, if any.
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    pub(crate) fn set_etag(&mut self, etag: Option<String>) {
        self.etag = etag;
    }

    /// The identifier of a compound index: its fields joined by `_`.
    pub fn compound_index_name(fields: &[String]) -> String {
        fields.join(COMPOUND_INDEX_SEPARATOR)
    }

    /// Applies an index definition to the catalog.
    ///
    /// A single field updates the single-field projection; multiple fields
    /// add a compound definition and mark each constituent field as
    /// indexed. The mutation is idempotent: reapplying an existing
    /// definition reports no change.
    ///
    /// # Errors
    ///
    /// Fails without mutating when `fields` is empty, when a hashed index
    /// spans multiple fields, or when the resulting indexed-field count
    /// would exceed the blob-tag limit. The tag-cap failure is permanent
    /// and must not be retried by callers.
    pub fn apply_index(&mut self, fields: &[String], options: &IndexOptions) -> StratusResult<bool> {
        if fields.is_empty() {
            log::error!("Cannot create an index over zero fields");
            return Err(StratusError::new(
                "Cannot create an index over zero fields",
                ErrorKind::ValidationError,
            ));
        }
        if options.hashed && fields.len() > 1 {
            log::error!("Hashed indexes are single-field only");
            return Err(StratusError::new(
                "Hashed indexes are single-field only",
                ErrorKind::ValidationError,
            ));
        }

        let mut projected = self.indexed_fields.clone();
        projected.extend(fields.iter().cloned());
        if projected.len() > MAX_INDEXED_FIELDS {
            log::error!(
                "Index would project {} fields, above the blob-tag limit of {}",
                projected.len(),
                MAX_INDEXED_FIELDS
            );
            return Err(StratusError::new(
                &format!(
                    "A collection cannot index more than {} fields",
                    MAX_INDEXED_FIELDS
                ),
                ErrorKind::ValidationError,
            ));
        }

        let mut changed = self.indexed_fields != projected;
        self.indexed_fields = projected;

        if fields.len() == 1 {
            let field = &fields[0];
            if options.unique {
                changed |= self.unique_fields.insert(field.clone());
            }
            if options.hashed {
                changed |= self.hashed_fields.insert(field.clone());
            }
        } else {
            let name = Self::compound_index_name(fields);
            let definition = CompoundIndex {
                fields: fields.to_vec(),
                unique: options.unique,
            };
            changed |= self.indexes.insert(name, definition.clone())
                != Some(definition);
        }

        Ok(changed)
    }

    /// Removes an index definition from the catalog.
    ///
    /// Multiple fields remove the matching compound definition. A single
    /// field removes the field from the projection (and from the unique and
    /// hashed sets) provided no surviving compound definition still
    /// references it. Reports whether anything changed.
    pub fn remove_index(&mut self, fields: &[String]) -> StratusResult<bool> {
        if fields.is_empty() {
            log::error!("Cannot drop an index over zero fields");
            return Err(StratusError::new(
                "Cannot drop an index over zero fields",
                ErrorKind::ValidationError,
            ));
        }

        if fields.len() > 1 {
            let name = Self::compound_index_name(fields);
            return Ok(self.indexes.remove(&name).is_some());
        }

        let field = &fields[0];
        let referenced = self
            .indexes
            .values()
            .any(|definition| definition.fields.contains(field));
        if referenced {
            log::error!(
                "Field {} is still referenced by a compound index and cannot be dropped",
                field
            );
            return Err(StratusError::new(
                &format!("Field {} is still referenced by a compound index", field),
                ErrorKind::InvalidOperation,
            ));
        }

        let mut changed = self.indexed_fields.remove(field);
        changed |= self.unique_fields.remove(field);
        changed |= self.hashed_fields.remove(field);
        Ok(changed)
    }

    /// Serializes the catalog payload (the entity tag travels out-of-band).
    pub fn to_bytes(&self) -> StratusResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserializes a catalog payload fetched from the store.
    pub fn from_bytes(bytes: &[u8]) -> StratusResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
