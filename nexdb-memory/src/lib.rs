//! Volatile in-process storage backend for nexdb.
//!
//! [`VolatileStore`] implements the `StorageBackend` trait over an async-aware
//! read-write lock. Documents are kept in their serialized (and, when a key is
//! configured, encrypted) form, so the store behaves like real storage: what comes
//! back out of [`stream`](nexdb_core::backend::StorageBackend::stream) has been
//! through the codec.
//!
//! Nothing survives a restart. Use it for development and tests.
//!
//! # Quick Start
//!
//! ```ignore
//! use nexdb::{memory::VolatileStore, prelude::*};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> DatabaseResult<()> {
//!     let backend = VolatileStore::builder().build().await?;
//!     let database = Database::open(Arc::new(backend), &DatabaseConfig::default()).await?;
//!
//!     let document = Document::builder().collection("users").field("name", "Alice").build();
//!     database.put(document, Durability::Persist).await?;
//!
//!     database.shutdown().await
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as nexdb_memory;

pub mod store;

pub use store::{VolatileStore, VolatileStoreBuilder};
