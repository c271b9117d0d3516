//! Core types for document representation.
//!
//! A [`Document`] is an identified, collection-tagged, schemaless JSON object. Its
//! identifier is a [`DocumentId`], a UUIDv7 whose canonical string form sorts in
//! creation order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::error::{DatabaseError, DatabaseResult};

/// The payload of a document: string keys mapped to arbitrary JSON values.
///
/// Keys iterate in sorted order.
pub type Payload = Map<String, Value>;

/// Process-wide unique, time-ordered document identifier.
///
/// Both the binary ordering and the hyphenated string form sort by creation time,
/// so IDs can be used directly as sortable object keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generates a fresh identifier from the current time.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// The all-zero identifier. Useful for fixtures.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Parses the canonical hyphenated (or simple) string form.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidDocument`] if the string is not a valid ID.
    pub fn parse(value: &str) -> DatabaseResult<Self> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|e| DatabaseError::InvalidDocument(format!("invalid document id {value:?}: {e}")))
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for DocumentId {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Uuid> for DocumentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A stored document.
///
/// Serializes as `{"_id": "...", "collection": "...", "data": {...}}`.
///
/// # Example
///
/// ```ignore
/// use nexdb::document::Document;
/// use serde_json::json;
///
/// let mut user = Document::new("users");
/// user.set_data(json!({ "name": "John", "address": { "city": "Leeds" } }).as_object().cloned().unwrap());
///
/// assert_eq!(user.field("address.city"), Some(&json!("Leeds")));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    id: DocumentId,
    collection: String,
    #[serde(default)]
    data: Payload,
}

impl Document {
    /// Creates an empty document in `collection` with a freshly generated ID.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            id: DocumentId::new(),
            collection: collection.into(),
            data: Payload::new(),
        }
    }

    /// Creates a builder for documents that need an explicit ID.
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::default()
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn data(&self) -> &Payload {
        &self.data
    }

    /// Replaces the whole payload.
    pub fn set_data(&mut self, data: Payload) {
        self.data = data;
    }

    /// Consumes the document, replacing its payload.
    pub fn with_data(mut self, data: Payload) -> Self {
        self.data = data;
        self
    }

    /// Returns an identity-only copy of this document with an empty payload.
    ///
    /// This is the snapshot carried by delete events; backends only need identity
    /// to remove the stored object.
    pub fn tombstone(&self) -> Self {
        Self {
            id: self.id,
            collection: self.collection.clone(),
            data: Payload::new(),
        }
    }

    /// Resolves a dot-separated field path against the payload.
    ///
    /// Each segment but the last must name a nested object. A missing segment, or
    /// an intermediate value that is not an object, resolves to `None`.
    pub fn field(&self, path: &str) -> Option<&Value> {
        resolve_path(&self.data, path)
    }
}

/// Walks `path` (dot-separated) through nested objects of `payload`.
pub fn resolve_path<'a>(payload: &'a Payload, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = payload.get(segments.next()?)?;

    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }

    Some(current)
}

/// Builder for [`Document`] instances.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    id: Option<DocumentId>,
    collection: String,
    data: Payload,
}

impl DocumentBuilder {
    /// Sets an explicit ID instead of generating one.
    pub fn id(mut self, id: DocumentId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn data(mut self, data: Payload) -> Self {
        self.data = data;
        self
    }

    /// Inserts a single payload field.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Document {
        Document {
            id: self.id.unwrap_or_default(),
            collection: self.collection,
            data: self.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_document_has_fresh_id_and_empty_payload() {
        let a = Document::new("test");
        let b = Document::new("test");

        assert_ne!(a.id(), b.id());
        assert_eq!(a.collection(), "test");
        assert!(a.data().is_empty());
    }

    #[test]
    fn ids_sort_in_creation_order() {
        let ids = (0..32).map(|_| DocumentId::new()).collect::<Vec<_>>();

        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);

        let mut strings = ids.iter().map(ToString::to_string).collect::<Vec<_>>();
        let original = strings.clone();
        strings.sort();
        assert_eq!(original, strings);
    }

    #[test]
    fn ids_are_time_ordered_uuids() {
        let id = DocumentId::new();
        assert_eq!(id.as_uuid().get_version_num(), 7);
        assert_eq!(DocumentId::from(*id.as_uuid()), id);
        assert!(DocumentId::nil().as_uuid().is_nil());
    }

    #[test]
    fn id_parses_its_display_form() {
        let id = DocumentId::new();
        assert_eq!(id.to_string().parse::<DocumentId>().unwrap(), id);
        assert!(DocumentId::parse("not-an-id").is_err());
    }

    #[test]
    fn serialized_form_uses_underscore_id() {
        let doc = Document::builder()
            .id(DocumentId::nil())
            .collection("users")
            .field("name", "John")
            .build();

        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({
                "_id": "00000000-0000-0000-0000-000000000000",
                "collection": "users",
                "data": { "name": "John" },
            })
        );
    }

    #[test]
    fn tombstone_keeps_identity_only() {
        let doc = Document::builder()
            .collection("users")
            .field("name", "John")
            .build();
        let tombstone = doc.tombstone();

        assert_eq!(tombstone.id(), doc.id());
        assert_eq!(tombstone.collection(), "users");
        assert!(tombstone.data().is_empty());
    }

    #[test]
    fn field_paths_walk_nested_objects() {
        let doc = Document::builder()
            .collection("users")
            .field("name", "John")
            .field("address", json!({ "city": { "name": "Leeds" } }))
            .build();

        assert_eq!(doc.field("name"), Some(&json!("John")));
        assert_eq!(doc.field("address.city.name"), Some(&json!("Leeds")));
        assert_eq!(doc.field("address.city"), Some(&json!({ "name": "Leeds" })));
        assert_eq!(doc.field("address.zip"), None);
        // "name" is a string, so it cannot be descended into.
        assert_eq!(doc.field("name.first"), None);
        assert_eq!(doc.field(""), None);
    }
}
