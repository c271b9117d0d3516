//! The composition root: cache, write-ahead queue and storage backend wired
//! together.
//!
//! Opening a database replays every stored document into the cache *before* the
//! queue consumer starts, so replay never re-enqueues anything and no event can
//! race the replay.
//!
//! # Examples
//!
//! ```ignore
//! use nexdb::prelude::*;
//! use std::sync::Arc;
//!
//! let backend = Arc::new(VolatileStore::new());
//! let database = Database::open(backend, &DatabaseConfig::default()).await?;
//!
//! let document = Document::builder().collection("users").field("name", "John").build();
//! database.put(document, Durability::Persist).await?;
//!
//! database.shutdown().await?;
//! ```

use futures::TryStreamExt;
use mea::mutex::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    backend::StorageBackend,
    cache::{DocumentCache, Durability},
    config::DatabaseConfig,
    document::{Document, DocumentId},
    error::{DatabaseError, DatabaseResult},
    query::Query,
    queue::{Operation, QueueState, QueueStats, WriteAheadQueue},
};

/// A running document database.
#[derive(Debug)]
pub struct Database {
    cache: DocumentCache,
    queue: Arc<WriteAheadQueue>,
    shutdown: CancellationToken,
    consumer: Mutex<Option<JoinHandle<DatabaseResult<()>>>>,
}

impl Database {
    /// Replays `backend` into a fresh cache, then starts the queue consumer.
    ///
    /// # Errors
    ///
    /// Any error yielded by the backend's stream aborts startup; a database that
    /// could only partially load its documents is not opened.
    pub async fn open(
        backend: Arc<dyn StorageBackend>,
        config: &DatabaseConfig,
    ) -> DatabaseResult<Self> {
        let queue = Arc::new(WriteAheadQueue::new(
            Arc::clone(&backend),
            config.queue_capacity,
        ));
        let cache = DocumentCache::new(Arc::clone(&queue));

        let mut replayed = 0usize;
        let mut stored = backend.stream();
        while let Some(document) = stored.try_next().await? {
            cache.put(document, Durability::Skip).await?;
            replayed += 1;
        }
        drop(stored);
        info!(replayed, "replayed stored documents into cache");

        let shutdown = CancellationToken::new();
        let consumer = queue.spawn(shutdown.clone());

        Ok(Self {
            cache,
            queue,
            shutdown,
            consumer: Mutex::new(Some(consumer)),
        })
    }

    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    /// See [`DocumentCache::put`].
    pub async fn put(&self, document: Document, durability: Durability) -> DatabaseResult<Operation> {
        self.cache.put(document, durability).await
    }

    /// See [`DocumentCache::get_by_id`].
    pub async fn get_by_id(&self, id: &DocumentId) -> Option<Arc<Document>> {
        self.cache.get_by_id(id).await
    }

    /// See [`DocumentCache::delete`].
    pub async fn delete(&self, id: &DocumentId) -> DatabaseResult<()> {
        self.cache.delete(id).await
    }

    /// See [`DocumentCache::filter`].
    pub async fn filter(&self, collection: &str, query: &Query) -> Vec<Arc<Document>> {
        self.cache.filter(collection, query).await
    }

    pub fn queue_state(&self) -> QueueState {
        self.queue.state()
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.queue.stats()
    }

    /// Stops accepting durability events and waits until every accepted event has
    /// been applied to storage.
    ///
    /// Reads keep working afterwards; later mutations only change memory. Calling
    /// this more than once is harmless.
    pub async fn shutdown(&self) -> DatabaseResult<()> {
        self.shutdown.cancel();
        self.queue.wait_for_shutdown().await;

        let consumer = self.consumer.lock().await.take();
        if let Some(consumer) = consumer {
            consumer
                .await
                .map_err(|err| DatabaseError::Unknown(format!("queue consumer failed: {err}")))??;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{backend::DocumentStream, queue::tests::RecordingBackend};
    use async_trait::async_trait;
    use futures::{StreamExt, stream};

    #[derive(Debug)]
    struct CorruptBackend;

    #[async_trait]
    impl StorageBackend for CorruptBackend {
        async fn write(&self, _document: &Document) -> DatabaseResult<()> {
            Ok(())
        }

        async fn delete(&self, _document: &Document) -> DatabaseResult<()> {
            Ok(())
        }

        fn stream(&self) -> DocumentStream<'_> {
            stream::iter([
                Ok(Document::new("test")),
                Err(DatabaseError::Decryption("authentication tag mismatch".into())),
            ])
            .boxed()
        }
    }

    #[tokio::test]
    async fn open_replays_without_re_enqueueing() {
        let backend = Arc::new(RecordingBackend::new());
        let stored = Document::builder().collection("test").field("name", "John").build();
        backend.write(&stored).await.unwrap();

        let database = Database::open(backend.clone(), &DatabaseConfig::default())
            .await
            .unwrap();

        assert_eq!(database.get_by_id(&stored.id()).await.as_deref(), Some(&stored));
        assert_eq!(database.filter("test", &Query::new()).await.len(), 1);

        database.shutdown().await.unwrap();
        assert_eq!(database.queue_stats(), QueueStats::default());
    }

    #[tokio::test]
    async fn shutdown_flushes_accepted_mutations() {
        let backend = Arc::new(RecordingBackend::new());
        let database = Database::open(backend.clone(), &DatabaseConfig::default())
            .await
            .unwrap();

        let kept = Document::new("test");
        let removed = Document::new("test");
        database.put(kept.clone(), Durability::Persist).await.unwrap();
        database.put(removed.clone(), Durability::Persist).await.unwrap();
        database.delete(&removed.id()).await.unwrap();

        database.shutdown().await.unwrap();
        assert_eq!(database.queue_state(), QueueState::Drained);

        let stored = backend.snapshot().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored.get(&kept.id()), Some(&kept));
    }

    #[tokio::test]
    async fn mutations_after_shutdown_stay_in_memory() {
        let backend = Arc::new(RecordingBackend::new());
        let database = Database::open(backend.clone(), &DatabaseConfig::default())
            .await
            .unwrap();
        database.shutdown().await.unwrap();

        let late = Document::new("test");
        database.put(late.clone(), Durability::Persist).await.unwrap();

        assert!(database.get_by_id(&late.id()).await.is_some());
        assert!(backend.snapshot().await.is_empty());

        database.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn replay_error_aborts_open() {
        let result = Database::open(Arc::new(CorruptBackend), &DatabaseConfig::default()).await;
        assert!(matches!(result, Err(DatabaseError::Decryption(_))));
    }
}
