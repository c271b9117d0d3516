//! Storage backend abstraction for durable persistence.
//!
//! The [`StorageBackend`] trait is the only thing the write-ahead queue and the
//! startup replay know about storage. Implementations exist for a volatile
//! in-process map (`nexdb-memory`) and for object storage (`nexdb-object-store`).
//!
//! # Contract
//!
//! - [`write`](StorageBackend::write) upserts by document identity. Writing a
//!   document whose ID is already stored replaces the stored copy.
//! - [`delete`](StorageBackend::delete) is idempotent. Deleting something that is
//!   not stored succeeds.
//! - [`stream`](StorageBackend::stream) lazily yields every stored document,
//!   decoded on the fly. Each call starts a fresh full scan.
//!
//! # Examples
//!
//! ```ignore
//! use nexdb::backend::StorageBackend;
//! use nexdb::memory::VolatileStore;
//! use futures::TryStreamExt;
//!
//! let backend = VolatileStore::new();
//! backend.write(&Document::new("users")).await?;
//!
//! let stored = backend.stream().try_collect::<Vec<_>>().await?;
//! assert_eq!(stored.len(), 1);
//! ```

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::{fmt::Debug, sync::Arc};

use crate::{document::Document, error::DatabaseResult};

/// A lazy, finite stream of stored documents.
pub type DocumentStream<'a> = BoxStream<'a, DatabaseResult<Document>>;

/// Abstract interface for durable document storage.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. During normal operation only the queue
/// consumer calls into a backend; during startup only the replay does.
#[async_trait]
pub trait StorageBackend: Send + Sync + Debug {
    /// Stores `document`, overwriting any stored document with the same ID.
    async fn write(&self, document: &Document) -> DatabaseResult<()>;

    /// Removes the stored copy of `document`. Only its identity is used.
    ///
    /// Removing a document that is not stored is not an error.
    async fn delete(&self, document: &Document) -> DatabaseResult<()>;

    /// Streams every stored document.
    ///
    /// The stream is not restartable; call `stream` again for a new scan. Decoding
    /// failures surface as `Err` items.
    fn stream(&self) -> DocumentStream<'_>;
}

#[async_trait]
impl<B> StorageBackend for Arc<B>
where
    B: StorageBackend + ?Sized,
{
    async fn write(&self, document: &Document) -> DatabaseResult<()> {
        (**self).write(document).await
    }

    async fn delete(&self, document: &Document) -> DatabaseResult<()> {
        (**self).delete(document).await
    }

    fn stream(&self) -> DocumentStream<'_> {
        (**self).stream()
    }
}

/// Factory trait for constructing a backend from its configuration.
#[async_trait]
pub trait StorageBackendBuilder {
    type Backend: StorageBackend;

    async fn build(self) -> DatabaseResult<Self::Backend>;
}
