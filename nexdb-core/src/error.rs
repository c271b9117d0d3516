//! Error types and result types for database operations.
//!
//! Every fallible operation in the workspace returns [`DatabaseResult<T>`]. The
//! [`DatabaseError`] variants fall into a small taxonomy (see [`ErrorKind`]) that
//! callers at the outer boundary use to decide how an error is surfaced.

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with the database.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The collection name is empty or only whitespace.
    #[error("collection name is empty")]
    CollectionNameEmpty,
    /// The collection name contains characters other than lowercase ASCII letters.
    #[error("collection name is invalid, must match the follow regex ^[a-z]*$")]
    CollectionNameInvalid(String),
    /// No live document has the given ID.
    #[error("document not found")]
    DocumentNotFound(String),
    /// No credential matched the presented key.
    #[error("unauthorized")]
    Unauthorized,
    /// The configuration is unusable. Fatal at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The encryption key does not have the length the cipher requires.
    #[error("encryption key must be {expected} bytes, got {actual}")]
    InvalidEncryptionKey {
        /// Required key length in bytes.
        expected: usize,
        /// Length of the key that was supplied.
        actual: usize,
    },
    /// The configured storage backend kind is not recognised.
    #[error("unknown storage driver: {0}")]
    UnknownStorageKind(String),
    /// Serialization/deserialization of a document failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Sealing a document body failed.
    #[error("Encryption error: {0}")]
    Encryption(String),
    /// Opening a sealed document body failed (wrong key, tampering or truncation).
    #[error("Decryption error: {0}")]
    Decryption(String),
    /// The document is structurally unusable (for example, a bad ID string).
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// An error occurred in the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
    /// `WriteAheadQueue::start` was called more than once.
    #[error("write-ahead queue has already been started")]
    QueueAlreadyStarted,
    /// An unknown error occurred.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Coarse classification of a [`DatabaseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad caller input. Never retried, never logged as a fault.
    Validation,
    /// The addressed document does not exist.
    NotFound,
    /// The caller's credentials were rejected.
    Unauthorized,
    /// Startup configuration is unusable.
    Configuration,
    /// Anything else. Details must not leak past the boundary.
    System,
}

impl DatabaseError {
    /// Returns the taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DatabaseError::CollectionNameEmpty | DatabaseError::CollectionNameInvalid(_) => {
                ErrorKind::Validation
            }
            DatabaseError::DocumentNotFound(_) => ErrorKind::NotFound,
            DatabaseError::Unauthorized => ErrorKind::Unauthorized,
            DatabaseError::Configuration(_)
            | DatabaseError::InvalidEncryptionKey { .. }
            | DatabaseError::UnknownStorageKind(_) => ErrorKind::Configuration,
            _ => ErrorKind::System,
        }
    }

    /// Stable numeric code for the error, as exposed to external callers.
    pub fn code(&self) -> u16 {
        match self {
            DatabaseError::CollectionNameEmpty => 1000,
            DatabaseError::CollectionNameInvalid(_) => 1001,
            DatabaseError::Unauthorized => 2000,
            DatabaseError::DocumentNotFound(_) => 3000,
            _ => 5000,
        }
    }

    /// The message that may be shown to an external caller.
    ///
    /// Taxonomy errors keep their text. System and configuration errors collapse to an
    /// opaque message; log the error itself before calling this.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::NotFound | ErrorKind::Unauthorized => {
                self.to_string()
            }
            ErrorKind::Configuration | ErrorKind::System => "internal error".to_string(),
        }
    }
}

/// A specialized `Result` type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

impl From<SerdeJsonError> for DatabaseError {
    fn from(err: SerdeJsonError) -> Self {
        DatabaseError::Serialization(err.to_string())
    }
}
