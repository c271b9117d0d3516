use std::sync::Arc;

use nexdb_core::{
    database::Database,
    document::{Document, DocumentId},
    error::{DatabaseError, DatabaseResult},
    query::Query,
};

/// Handles document lookups and collection searches.
#[derive(Debug, Clone)]
pub struct Reader {
    database: Arc<Database>,
}

impl Reader {
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Returns the live document with the given ID.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DocumentNotFound`] when no live document has that ID,
    /// including when `id` is not a document ID at all.
    pub async fn get_document(&self, id: &str) -> DatabaseResult<Arc<Document>> {
        let not_found = || DatabaseError::DocumentNotFound(id.to_string());

        let id = DocumentId::parse(id).map_err(|_| not_found())?;
        self.database.get_by_id(&id).await.ok_or_else(not_found)
    }

    /// Returns the documents of `collection` that satisfy `query`, oldest first.
    ///
    /// An unknown collection yields an empty result.
    pub async fn search_documents(
        &self,
        collection: &str,
        query: &Query,
    ) -> DatabaseResult<Vec<Arc<Document>>> {
        Ok(self.database.filter(collection, query).await)
    }
}
