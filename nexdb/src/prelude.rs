//! Convenient re-exports of commonly used types from nexdb.
//!
//! Import this prelude module to quickly access the most frequently used types
//! and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use nexdb::prelude::*;
//! ```

pub use nexdb_core::{
    backend::{DocumentStream, StorageBackend, StorageBackendBuilder},
    cache::{DocumentCache, Durability},
    codec::{DocumentCodec, EncryptionKey},
    config::{DatabaseConfig, StorageConfig, StorageKind},
    database::Database,
    document::{Document, DocumentBuilder, DocumentId, Payload},
    error::{DatabaseError, DatabaseResult, ErrorKind},
    query::{Condition, Element, Operator, Query, QueryBuilder},
    queue::{Event, Operation, QueueState, QueueStats, WriteAheadQueue},
};

pub use crate::{
    memory::{VolatileStore, VolatileStoreBuilder},
    services::{AuthService, Reader, Writer},
    validation::validate_collection_name,
};
