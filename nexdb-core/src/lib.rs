//! A minimal document database: an authoritative in-memory cache made durable by an
//! ordered write-ahead queue.
//!
//! This crate is the core of the nexdb project and provides:
//!
//! - **Documents** ([`document`]) - The document model, IDs and dot-path field access
//! - **Codec** ([`codec`]) - Serialized form and optional AES-256-GCM encryption at rest
//! - **Storage backend abstraction** ([`backend`]) - Traits for durable storage implementations
//! - **Queries** ([`query`], [`evaluator`]) - JSON-shaped AND/OR filters and their evaluation
//! - **Write-ahead queue** ([`queue`]) - Ordered, draining single-consumer persistence
//! - **Cache** ([`cache`]) - The live document set every read is served from
//! - **Database** ([`database`]) - Startup replay and shutdown around cache and queue
//! - **Configuration** ([`config`]) - Environment-driven startup configuration
//! - **Error handling** ([`error`]) - Error taxonomy and result types
//!
//! # Example
//!
//! ```ignore
//! use nexdb_core::{cache::Durability, config::DatabaseConfig, database::Database, document::Document};
//!
//! let database = Database::open(backend, &DatabaseConfig::default()).await?;
//!
//! let document = Document::builder().collection("users").field("name", "Alice").build();
//! database.put(document.clone(), Durability::Persist).await?;
//!
//! assert!(database.get_by_id(&document.id()).await.is_some());
//! database.shutdown().await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as nexdb_core;

pub mod backend;
pub mod cache;
pub mod codec;
pub mod config;
pub mod database;
pub mod document;
pub mod error;
pub mod evaluator;
pub mod query;
pub mod queue;
