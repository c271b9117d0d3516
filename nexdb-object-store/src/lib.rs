//! Object storage backend implementation for nexdb.
//!
//! This crate provides an implementation of the `StorageBackend` trait on top of the
//! [`object_store`] crate. Each document is one object, keyed `{collection}/{id}`,
//! whose body is the document's encoded (and optionally encrypted) form.
//!
//! In production the backend talks to Amazon S3. Any other [`ObjectStore`] can be
//! plugged in through [`ObjectStorage::new`]; the tests use the in-memory one.
//!
//! To use this backend, include the `object-store` feature in your `Cargo.toml`
//! (enabled by default):
//!
//! ```toml
//! [dependencies]
//! nexdb = { version = "x.y.z", features = ["object-store"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use nexdb::{backend::StorageBackendBuilder, object_store::ObjectStorage};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = ObjectStorage::builder("my-bucket")
//!         .region("eu-west-2")
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! [`ObjectStore`]: object_store::ObjectStore

#[allow(unused_extern_crates)]
extern crate self as nexdb_object_store;

pub mod keys;
pub mod store;

pub use store::{ObjectStorage, ObjectStorageBuilder};
