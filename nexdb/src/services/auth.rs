use std::sync::Arc;
use tracing::info;

use nexdb_core::{
    cache::Durability,
    database::Database,
    document::Document,
    error::{DatabaseError, DatabaseResult},
    query::{Condition, Query},
};

use crate::services::report;

/// Collection holding API key documents. Its name is outside the user namespace,
/// so the writer can never touch it.
pub const API_KEYS_COLLECTION: &str = "_api_keys";

/// Payload field holding the key itself.
pub const KEY_FIELD: &str = "key";

/// Checks presented API keys against the stored ones.
#[derive(Debug, Clone)]
pub struct AuthService {
    database: Arc<Database>,
}

impl AuthService {
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Succeeds if an API key document with `key` exists.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Unauthorized`] otherwise.
    pub async fn authenticate(&self, key: &str) -> DatabaseResult<()> {
        if key.is_empty() {
            return Err(DatabaseError::Unauthorized);
        }

        let query = Query::builder().and(Condition::equals(KEY_FIELD, key)).build();
        if self.database.filter(API_KEYS_COLLECTION, &query).await.is_empty() {
            return Err(DatabaseError::Unauthorized);
        }

        Ok(())
    }

    /// Makes sure at least one API key exists.
    ///
    /// When none does, `bootstrap_key` is stored as the first key.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Configuration`] when no key exists and no bootstrap
    /// key was given.
    pub async fn ensure_api_key(&self, bootstrap_key: Option<&str>) -> DatabaseResult<()> {
        if !self.database.filter(API_KEYS_COLLECTION, &Query::new()).await.is_empty() {
            return Ok(());
        }

        let Some(key) = bootstrap_key.filter(|key| !key.is_empty()) else {
            return Err(DatabaseError::Configuration(
                "no api keys found in database, please add one".into(),
            ));
        };

        let document = Document::builder()
            .collection(API_KEYS_COLLECTION)
            .field(KEY_FIELD, key)
            .build();

        self.database
            .put(document, Durability::Persist)
            .await
            .map_err(|err| report("ensure_api_key", err))?;
        info!("stored bootstrap api key");

        Ok(())
    }
}
