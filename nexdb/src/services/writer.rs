use serde_json::Value;
use std::sync::Arc;

use nexdb_core::{
    cache::Durability,
    database::Database,
    document::{Document, DocumentId, Payload},
    error::{DatabaseError, DatabaseResult},
};

use crate::{services::report, validation::validate_collection_name};

/// Payload key that addresses an existing document on write.
pub const ID_FIELD: &str = "_id";

/// Handles document writes and deletes.
#[derive(Debug, Clone)]
pub struct Writer {
    database: Arc<Database>,
}

impl Writer {
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Creates a document in `collection`, or replaces the payload of an existing one.
    ///
    /// If `data` carries an `_id` the write is an update: the addressed document must
    /// be live and belong to `collection`. The `_id` key is removed and the remaining
    /// payload replaces the stored one. Without `_id` a new document is created.
    ///
    /// Returns the document as written.
    ///
    /// # Errors
    ///
    /// - Collection name validation errors.
    /// - [`DatabaseError::DocumentNotFound`] when the `_id` addresses no live document
    ///   in `collection`.
    pub async fn write_document(&self, collection: &str, mut data: Payload) -> DatabaseResult<Document> {
        validate_collection_name(collection)?;

        let document = match data.remove(ID_FIELD) {
            Some(id) => {
                let mut existing = self.existing(&id, collection).await?;
                existing.set_data(data);
                existing
            }
            None => Document::new(collection).with_data(data),
        };

        self.database
            .put(document.clone(), Durability::Persist)
            .await
            .map_err(|err| report("write_document", err))?;

        Ok(document)
    }

    /// Deletes the document with the given ID.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DocumentNotFound`] when no live document has that ID.
    pub async fn delete_document(&self, id: &str) -> DatabaseResult<()> {
        let id = DocumentId::parse(id).map_err(|_| DatabaseError::DocumentNotFound(id.to_string()))?;

        if self.database.get_by_id(&id).await.is_none() {
            return Err(DatabaseError::DocumentNotFound(id.to_string()));
        }

        self.database
            .delete(&id)
            .await
            .map_err(|err| report("delete_document", err))
    }

    async fn existing(&self, id: &Value, collection: &str) -> DatabaseResult<Document> {
        let not_found = || {
            DatabaseError::DocumentNotFound(id.as_str().map_or_else(|| id.to_string(), str::to_string))
        };

        let id = id
            .as_str()
            .and_then(|id| DocumentId::parse(id).ok())
            .ok_or_else(not_found)?;

        match self.database.get_by_id(&id).await {
            Some(document) if document.collection() == collection => Ok(Document::clone(&document)),
            _ => Err(not_found()),
        }
    }
}
