//! Main nexdb crate providing the database, its storage backends and the service
//! layer.
//!
//! This crate is the primary entry point for users of nexdb. It re-exports the
//! core types from `nexdb-core`, exposes the storage backends and adds the services
//! a transport sits on.
//!
//! # Features
//!
//! - **Memory-speed reads** - Every read is served from the in-memory cache
//! - **Ordered durability** - Mutations reach storage in the order they happened
//! - **Encryption at rest** - Optional AES-256-GCM for stored document bodies
//! - **Pluggable storage** - Volatile in-process storage or S3 object storage
//!
//! # Quick Start
//!
//! ```ignore
//! use nexdb::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> DatabaseResult<()> {
//!     let config = DatabaseConfig::from_env()?;
//!     let database = nexdb::open(&config).await?;
//!
//!     let writer = Writer::new(database.clone());
//!     let reader = Reader::new(database.clone());
//!
//!     let data = json!({ "name": "Alice" }).as_object().cloned().unwrap_or_default();
//!     let document = writer.write_document("users", data).await?;
//!
//!     let found = reader
//!         .search_documents(
//!             "users",
//!             &Query::builder().and(Condition::equals("name", "Alice")).build(),
//!         )
//!         .await?;
//!     assert_eq!(found[0].id(), document.id());
//!
//!     // Flush everything accepted so far to storage
//!     database.shutdown().await
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Volatile in-process storage for development and testing
//! - [`object_store`] - S3 object storage (requires the `object-store` feature)

use std::sync::Arc;
use tracing::info;

use nexdb_core::{
    backend::{StorageBackend, StorageBackendBuilder},
    config::{DatabaseConfig, StorageConfig, StorageKind},
    database::Database,
    error::DatabaseResult,
};

pub mod prelude;
pub mod services;
pub mod validation;

pub use nexdb_core::{backend, cache, codec, config, database, document, error, evaluator, query, queue};

// Re-export JSON types for convenience
pub use serde_json;

/// Volatile in-process storage backend.
pub mod memory {
    pub use nexdb_memory::{VolatileStore, VolatileStoreBuilder};
}

/// Object storage backend.
///
/// This module is only available when the `object-store` feature is enabled.
#[cfg(feature = "object-store")]
pub mod object_store {
    pub use nexdb_object_store::{ObjectStorage, ObjectStorageBuilder, keys::object_key};
}

/// Builds the storage backend `config` selects.
///
/// # Errors
///
/// Returns a configuration error when the selected backend cannot be built, for
/// example object storage without a bucket.
pub async fn open_backend(config: &StorageConfig) -> DatabaseResult<Arc<dyn StorageBackend>> {
    info!(
        driver = %config.kind,
        encrypted = config.encryption_key.is_some(),
        "opening storage backend"
    );

    match config.kind {
        StorageKind::Memory => {
            let mut builder = memory::VolatileStore::builder();
            if let Some(key) = &config.encryption_key {
                builder = builder.encryption_key(key.clone());
            }
            Ok(Arc::new(builder.build().await?))
        }
        #[cfg(feature = "object-store")]
        StorageKind::AwsS3 => Ok(Arc::new(
            object_store::ObjectStorageBuilder::from_config(config).build().await?,
        )),
        #[cfg(not(feature = "object-store"))]
        StorageKind::AwsS3 => Err(nexdb_core::error::DatabaseError::Configuration(format!(
            "storage driver {} requires the `object-store` feature",
            config.kind
        ))),
    }
}

/// Opens a database as configured: builds the backend, replays it into the cache,
/// starts the write-ahead queue and makes sure an API key exists.
///
/// # Errors
///
/// Fails on any configuration or replay error, and when no API key exists and
/// none is configured. Nothing is left running on failure.
pub async fn open(config: &DatabaseConfig) -> DatabaseResult<Arc<Database>> {
    let backend = open_backend(&config.storage).await?;
    let database = Arc::new(Database::open(backend, config).await?);

    let auth = services::AuthService::new(database.clone());
    if let Err(err) = auth.ensure_api_key(config.api_key.as_deref()).await {
        database.shutdown().await?;
        return Err(err);
    }

    Ok(database)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::AuthService;
    use futures::TryStreamExt;
    use nexdb_core::{codec::EncryptionKey, document::Document, error::DatabaseError};

    #[tokio::test]
    async fn open_bootstraps_the_configured_key() {
        let config = DatabaseConfig {
            api_key: Some("secret".into()),
            ..DatabaseConfig::default()
        };

        let database = open(&config).await.unwrap();

        AuthService::new(database.clone()).authenticate("secret").await.unwrap();
        database.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn memory_backend_honours_the_configured_key() {
        let key = EncryptionKey::new(b"0123456789abcdef0123456789abcdef").unwrap();
        let backend = open_backend(&StorageConfig::memory().with_encryption_key(key))
            .await
            .unwrap();

        let document = Document::builder().collection("secrets").field("pin", "4242").build();
        backend.write(&document).await.unwrap();

        let stored: Vec<Document> = backend.stream().try_collect().await.unwrap();
        assert_eq!(stored, vec![document]);
        assert!(format!("{backend:?}").contains("encrypted: true"));
    }

    #[tokio::test]
    async fn open_without_any_key_fails() {
        let err = open(&DatabaseConfig::default()).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Configuration(_)));
    }

    #[cfg(feature = "object-store")]
    #[tokio::test]
    async fn object_storage_without_bucket_fails() {
        let config = StorageConfig {
            kind: StorageKind::AwsS3,
            ..StorageConfig::default()
        };

        let err = open_backend(&config).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Configuration(_)));
    }
}
