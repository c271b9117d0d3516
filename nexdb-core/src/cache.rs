//! The authoritative in-memory document cache.
//!
//! All reads are served from the cache. Writes and deletes mutate the cache first
//! and then hand a durability [`Event`] to the [`WriteAheadQueue`]; they return
//! without waiting for storage.
//!
//! # Concurrency
//!
//! The live set sits behind a single read-write lock. Any number of readers run
//! together; a mutation holds the write lock only for the map update itself. The
//! enqueue happens after the write lock is released, so a full queue never stalls
//! readers.
//!
//! Mutations additionally pass through a writer gate held across "mutate, then
//! enqueue". Two writers therefore reach the queue in the same order in which they
//! changed memory, which keeps same-document events ordered in storage.

use mea::{mutex::Mutex, rwlock::RwLock};
use std::{collections::BTreeMap, sync::Arc};
use tracing::debug;

use crate::{
    document::{Document, DocumentId},
    error::DatabaseResult,
    evaluator::DocumentEvaluator,
    query::Query,
    queue::{Event, Operation, WriteAheadQueue},
};

/// Whether a `put` should be made durable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Durability {
    /// Enqueue the mutation for the storage backend.
    Persist,
    /// The document is already durable (startup replay); only update memory.
    Skip,
}

/// In-memory map of live documents, keyed by ID.
///
/// Documents are handed out as `Arc<Document>`; the cache's copy cannot be mutated
/// except through [`put`](Self::put) and [`delete`](Self::delete).
#[derive(Debug)]
pub struct DocumentCache {
    documents: RwLock<BTreeMap<DocumentId, Arc<Document>>>,
    writers: Mutex<()>,
    queue: Arc<WriteAheadQueue>,
}

impl DocumentCache {
    pub fn new(queue: Arc<WriteAheadQueue>) -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
            writers: Mutex::new(()),
            queue,
        }
    }

    /// Inserts or replaces a document.
    ///
    /// Returns [`Operation::Create`] if the ID was new and [`Operation::Update`] if it
    /// replaced a live document. The new state is visible to readers before the
    /// durability event is enqueued. With [`Durability::Skip`] nothing is enqueued.
    ///
    /// Replacing a document with one in another collection first enqueues a delete
    /// of the old copy, since backends may key stored objects by collection.
    pub async fn put(&self, document: Document, durability: Durability) -> DatabaseResult<Operation> {
        let _writer = self.writers.lock().await;
        let document = Arc::new(document);

        let previous = self
            .documents
            .write()
            .await
            .insert(document.id(), Arc::clone(&document));

        let operation = match previous {
            Some(_) => Operation::Update,
            None => Operation::Create,
        };

        if durability == Durability::Persist {
            if let Some(previous) = previous.filter(|p| p.collection() != document.collection()) {
                debug!(
                    id = %document.id(),
                    from = previous.collection(),
                    to = document.collection(),
                    "document moved between collections"
                );
                self.queue.push(Event::delete(previous.tombstone())).await;
            }
            self.queue.push(Event::new(operation, document)).await;
        }

        Ok(operation)
    }

    /// Looks up a live document by ID.
    pub async fn get_by_id(&self, id: &DocumentId) -> Option<Arc<Document>> {
        self.documents.read().await.get(id).cloned()
    }

    /// Removes a live document.
    ///
    /// Deleting an unknown ID is a no-op and enqueues nothing.
    pub async fn delete(&self, id: &DocumentId) -> DatabaseResult<()> {
        let _writer = self.writers.lock().await;

        let Some(removed) = self.documents.write().await.remove(id) else {
            debug!(%id, "delete of unknown document ignored");
            return Ok(());
        };

        self.queue
            .push(Event::delete(removed.tombstone()))
            .await;

        Ok(())
    }

    /// Returns every live document in `collection` that satisfies `query`.
    ///
    /// Results come back in ID order, which is creation order.
    pub async fn filter(&self, collection: &str, query: &Query) -> Vec<Arc<Document>> {
        self.documents
            .read()
            .await
            .values()
            .filter(|document| document.collection() == collection)
            .filter(|document| DocumentEvaluator::new(document.data()).evaluate(query))
            .cloned()
            .collect()
    }

    /// Number of live documents across all collections.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        query::Condition,
        queue::{DEFAULT_QUEUE_CAPACITY, tests::RecordingBackend},
    };
    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    struct Harness {
        backend: Arc<RecordingBackend>,
        queue: Arc<WriteAheadQueue>,
        cache: DocumentCache,
        shutdown: CancellationToken,
    }

    impl Harness {
        fn new() -> Self {
            let backend = Arc::new(RecordingBackend::new());
            let queue = Arc::new(WriteAheadQueue::new(backend.clone(), DEFAULT_QUEUE_CAPACITY));
            let shutdown = CancellationToken::new();
            queue.spawn(shutdown.clone());

            Self {
                backend,
                cache: DocumentCache::new(queue.clone()),
                queue,
                shutdown,
            }
        }

        async fn drain(&self) {
            self.shutdown.cancel();
            self.queue.wait_for_shutdown().await;
        }
    }

    fn payload(value: serde_json::Value) -> crate::document::Payload {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn read_after_write() {
        let harness = Harness::new();
        let doc = Document::builder().collection("test").field("name", "John").build();

        let operation = harness.cache.put(doc.clone(), Durability::Persist).await.unwrap();

        assert_eq!(operation, Operation::Create);
        assert_eq!(harness.cache.get_by_id(&doc.id()).await.as_deref(), Some(&doc));
    }

    #[tokio::test]
    async fn put_with_existing_id_replaces() {
        let harness = Harness::new();
        let mut doc = Document::builder().collection("test").field("v", 1).build();
        harness.cache.put(doc.clone(), Durability::Persist).await.unwrap();

        doc.set_data(payload(json!({ "v": 2 })));
        let operation = harness.cache.put(doc.clone(), Durability::Persist).await.unwrap();

        assert_eq!(operation, Operation::Update);
        assert_eq!(harness.cache.len().await, 1);
        assert_eq!(harness.cache.get_by_id(&doc.id()).await.unwrap().field("v"), Some(&json!(2)));

        let scanned = harness.cache.filter("test", &Query::new()).await;
        assert_eq!(scanned.len(), 1);

        harness.drain().await;
        assert_eq!(harness.backend.snapshot().await.get(&doc.id()), Some(&doc));
    }

    #[tokio::test]
    async fn delete_removes_and_is_idempotent() {
        let harness = Harness::new();
        let doc = Document::new("test");
        harness.cache.put(doc.clone(), Durability::Persist).await.unwrap();

        harness.cache.delete(&doc.id()).await.unwrap();
        assert!(harness.cache.get_by_id(&doc.id()).await.is_none());

        harness.cache.delete(&doc.id()).await.unwrap();
        harness.cache.delete(&DocumentId::new()).await.unwrap();
        assert!(harness.cache.is_empty().await);

        harness.drain().await;
        assert!(harness.backend.snapshot().await.is_empty());
        // One create and one delete; the no-op deletes enqueue nothing.
        assert_eq!(harness.queue.stats().processed, 2);
    }

    #[tokio::test]
    async fn skip_durability_only_updates_memory() {
        let harness = Harness::new();
        let doc = Document::new("test");

        harness.cache.put(doc.clone(), Durability::Skip).await.unwrap();
        assert!(harness.cache.get_by_id(&doc.id()).await.is_some());

        harness.drain().await;
        assert!(harness.backend.snapshot().await.is_empty());
        assert_eq!(harness.queue.stats().processed, 0);
    }

    #[tokio::test]
    async fn filter_restricts_to_collection_and_query() {
        let harness = Harness::new();
        let john = Document::builder().collection("users").field("name", "John").build();
        let jane = Document::builder().collection("users").field("name", "Jane").build();
        let other = Document::builder().collection("admins").field("name", "John").build();

        for doc in [&john, &jane, &other] {
            harness.cache.put(doc.clone(), Durability::Persist).await.unwrap();
        }

        let all = harness.cache.filter("users", &Query::new()).await;
        assert_eq!(
            all.iter().map(|doc| doc.id()).collect::<Vec<_>>(),
            vec![john.id(), jane.id()]
        );

        let johns = harness
            .cache
            .filter("users", &Query::builder().and(Condition::equals("name", "John")).build())
            .await;
        assert_eq!(johns.len(), 1);
        assert_eq!(johns[0].id(), john.id());

        assert!(harness.cache.filter("nobody", &Query::new()).await.is_empty());
    }

    #[tokio::test]
    async fn collection_change_deletes_the_old_copy_first() {
        let harness = Harness::new();
        let before = Document::builder().collection("zeta").field("v", "old").build();
        let after = Document::builder()
            .id(before.id())
            .collection("alpha")
            .field("v", "new")
            .build();

        harness.cache.put(before, Durability::Persist).await.unwrap();
        let operation = harness.cache.put(after.clone(), Durability::Persist).await.unwrap();
        assert_eq!(operation, Operation::Update);

        harness.drain().await;
        // Create, delete of the old copy, update.
        assert_eq!(harness.queue.stats().processed, 3);
        assert_eq!(harness.backend.snapshot().await.get(&after.id()), Some(&after));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_keep_storage_in_step_with_memory() {
        let harness = Arc::new(Harness::new());
        let id = DocumentId::new();

        let writers = (0..16)
            .map(|i| {
                let harness = harness.clone();
                tokio::spawn(async move {
                    let doc = Document::builder().id(id).collection("test").field("v", i).build();
                    harness.cache.put(doc, Durability::Persist).await.unwrap();
                })
            })
            .collect::<Vec<_>>();
        for writer in writers {
            writer.await.unwrap();
        }

        harness.drain().await;

        let in_memory = harness.cache.get_by_id(&id).await.unwrap();
        let stored = harness.backend.snapshot().await;
        assert_eq!(stored.get(&id), Some(in_memory.as_ref()));
    }
}
