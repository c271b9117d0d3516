//! In-memory storage implementation.
//!
//! Documents are stored as encoded bodies in a `BTreeMap` keyed by document ID,
//! behind an async-safe read-write lock.

use async_trait::async_trait;
use futures::{StreamExt, stream};
use mea::rwlock::RwLock;
use std::{collections::BTreeMap, sync::Arc};
use tracing::debug;

use nexdb_core::{
    backend::{DocumentStream, StorageBackend, StorageBackendBuilder},
    codec::{DocumentCodec, EncryptionKey},
    document::{Document, DocumentId},
    error::DatabaseResult,
};

type BodyMap = BTreeMap<DocumentId, Vec<u8>>;

/// Thread-safe volatile storage backend.
///
/// # Thread Safety
///
/// `VolatileStore` is cloneable and uses an `Arc`-wrapped map, so clones share the
/// same stored documents. A clone kept outside a database can therefore observe
/// what the database persisted.
///
/// # Example
///
/// ```ignore
/// use nexdb_memory::VolatileStore;
/// use nexdb::backend::StorageBackend;
/// use futures::TryStreamExt;
///
/// let store = VolatileStore::new();
/// store.write(&Document::new("users")).await?;
///
/// let stored: Vec<_> = store.stream().try_collect().await?;
/// assert_eq!(stored.len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct VolatileStore {
    bodies: Arc<RwLock<BodyMap>>,
    codec: DocumentCodec,
}

impl VolatileStore {
    /// Creates an empty store that keeps documents unencrypted.
    pub fn new() -> Self {
        Self::with_codec(DocumentCodec::plain())
    }

    /// Creates an empty store that encodes documents with `codec`.
    pub fn with_codec(codec: DocumentCodec) -> Self {
        Self {
            bodies: Arc::new(RwLock::new(BodyMap::new())),
            codec,
        }
    }

    /// Creates a builder for constructing a `VolatileStore` with custom options.
    pub fn builder() -> VolatileStoreBuilder {
        VolatileStoreBuilder::default()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.bodies.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.bodies.read().await.is_empty()
    }
}

impl Default for VolatileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for VolatileStore {
    async fn write(&self, document: &Document) -> DatabaseResult<()> {
        let body = self.codec.encode(document)?;
        self.bodies.write().await.insert(document.id(), body);

        Ok(())
    }

    async fn delete(&self, document: &Document) -> DatabaseResult<()> {
        if self.bodies.write().await.remove(&document.id()).is_none() {
            debug!(id = %document.id(), "document was not stored, nothing to delete");
        }

        Ok(())
    }

    fn stream(&self) -> DocumentStream<'_> {
        // Bodies are copied out under the read lock and decoded one at a time.
        stream::once(async move {
            self.bodies
                .read()
                .await
                .values()
                .cloned()
                .collect::<Vec<_>>()
        })
        .flat_map(move |bodies| stream::iter(bodies).map(move |body| self.codec.decode(&body)))
        .boxed()
    }
}

/// Builder for constructing [`VolatileStore`] instances.
///
/// # Example
///
/// ```ignore
/// use nexdb_memory::VolatileStore;
/// use nexdb::backend::StorageBackendBuilder;
///
/// let store = VolatileStore::builder()
///     .encryption_key(key)
///     .build()
///     .await?;
/// ```
#[derive(Default)]
pub struct VolatileStoreBuilder {
    encryption_key: Option<EncryptionKey>,
}

impl VolatileStoreBuilder {
    /// Encrypts stored bodies with `key`.
    pub fn encryption_key(mut self, key: EncryptionKey) -> Self {
        self.encryption_key = Some(key);
        self
    }
}

#[async_trait]
impl StorageBackendBuilder for VolatileStoreBuilder {
    type Backend = VolatileStore;

    /// Builds and returns a new, empty [`VolatileStore`].
    async fn build(self) -> DatabaseResult<Self::Backend> {
        let codec = DocumentCodec::from_key(self.encryption_key.as_ref());
        Ok(VolatileStore::with_codec(codec))
    }
}
