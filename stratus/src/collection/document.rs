use crate::common::{DOC_ID, SYSTEM_PREFIX};
use crate::errors::{ErrorKind, StratusError, StratusResult};
use serde_json::{Map, Value};
use std::fmt::{Debug, Display, Formatter};

/// Represents a document in a Stratus collection.
///
/// Stratus documents are composed of key-value pairs. The key is always a
/// [String] and the value is any JSON-representable [Value]. Documents are
/// persisted as UTF-8 JSON, one blob per document, and carry a canonical
/// `id` field equal to the blob name within the collection's container.
///
/// Documents are mutated only by full replacement: `update` overwrites the
/// stored blob with the new document in its entirety.
///
/// # Examples
///
/// ```ignore
/// let mut doc = Document::new();
/// doc.put("name", "Alice")?;
/// doc.put("age", 30)?;
/// assert_eq!(doc.len(), 2);
/// ```
#[derive(Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct Document {
    data: Map<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document { data: Map::new() }
    }

    /// Creates a document from a JSON object map.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Document { data: map }
    }

    /// Checks if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of fields in the document.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Associates the specified value with the specified key in this document.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty, or if the key is the canonical
    /// `id` field with a non-string value.
    pub fn put<T: Into<Value>>(&mut self, key: &str, value: T) -> StratusResult<()> {
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(StratusError::new(
                "Document does not support empty key",
                ErrorKind::InvalidOperation,
            ));
        }

        let value = value.into();
        if key == DOC_ID && !value.is_string() {
            log::error!("Document id must be a string value");
            return Err(StratusError::new(
                "Document id must be a string value",
                ErrorKind::InvalidOperation,
            ));
        }

        self.data.insert(key.to_string(), value);
        Ok(())
    }

    /// Retrieves the value associated with the key, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Removes the value associated with the key, returning it if present.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Returns the canonical document id, if set.
    pub fn id(&self) -> Option<&str> {
        self.data.get(DOC_ID).and_then(Value::as_str)
    }

    /// Sets the canonical document id.
    pub(crate) fn set_id(&mut self, id: &str) {
        self.data
            .insert(DOC_ID.to_string(), Value::String(id.to_string()));
    }

    /// Iterates over the document's fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    /// Serializes the document as UTF-8 JSON bytes for blob storage.
    pub fn to_bytes(&self) -> StratusResult<Vec<u8>> {
        Ok(serde_json::to_vec(&self.data)?)
    }

    /// Deserializes a document from UTF-8 JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns an error when the payload is not valid JSON or is not a JSON
    /// object.
    pub fn from_bytes(bytes: &[u8]) -> StratusResult<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        Document::try_from(value)
    }
}

impl TryFrom<Value> for Document {
    type Error = StratusError;

    fn try_from(value: Value) -> StratusResult<Self> {
        match value {
            Value::Object(map) => Ok(Document { data: map }),
            other => {
                log::error!("Cannot create document from non-object value: {}", other);
                Err(StratusError::new(
                    "Document payload must be a JSON object",
                    ErrorKind::ValidationError,
                ))
            }
        }
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Object(doc.data)
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::Object(self.data.clone()))
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

/// Validates a caller-supplied document id.
///
/// System blob names (prefixed `__`) are reserved and cannot collide with
/// documents.
pub(crate) fn validate_document_id(id: &str) -> StratusResult<()> {
    if id.is_empty() {
        log::error!("Document id cannot be empty");
        return Err(StratusError::new(
            "Document id cannot be empty",
            ErrorKind::InvalidName,
        ));
    }
    if id.starts_with(SYSTEM_PREFIX) {
        log::error!("Document id {} collides with the system blob namespace", id);
        return Err(StratusError::new(
            &format!("Document id {} is reserved", id),
            ErrorKind::InvalidName,
        ));
    }
    Ok(())
}

/// Creates a [Document] from a JSON object literal.
///
/// # Examples
///
/// ```ignore
/// let doc = doc! {
///     "name": "Alice",
///     "age": 30,
/// };
/// assert_eq!(doc.get("name").and_then(|v| v.as_str()), Some("Alice"));
/// ```
#[macro_export]
macro_rules! doc {
    ($($body:tt)*) => {{
        match ::serde_json::json!({ $($body)* }) {
            ::serde_json::Value::Object(map) => $crate::collection::Document::from_map(map),
            _ => unreachable!(),
        }
    }};
}
