//! Startup configuration.
//!
//! Configuration is read once, at startup, from environment variables:
//!
//! | variable | meaning | default |
//! |---|---|---|
//! | `NEXDB_STORAGE_DRIVER` | `memory` or `aws-s3` | `memory` |
//! | `NEXDB_ENCRYPTION_KEY` | at-rest key, exactly 32 bytes | none (plaintext) |
//! | `AWS_REGION` | object storage region | none |
//! | `AWS_BUCKET` | object storage bucket, required for `aws-s3` | none |
//! | `NEXDB_QUEUE_CAPACITY` | write-ahead queue intake size | `64` |
//! | `NEXDB_API_KEY` | bootstrap API key | none |
//!
//! Every problem found here is a configuration error and is fatal.

use std::{fmt, str::FromStr};

use crate::{
    codec::EncryptionKey,
    error::{DatabaseError, DatabaseResult},
    queue::DEFAULT_QUEUE_CAPACITY,
};

pub const STORAGE_DRIVER_VAR: &str = "NEXDB_STORAGE_DRIVER";
pub const ENCRYPTION_KEY_VAR: &str = "NEXDB_ENCRYPTION_KEY";
pub const REGION_VAR: &str = "AWS_REGION";
pub const BUCKET_VAR: &str = "AWS_BUCKET";
pub const QUEUE_CAPACITY_VAR: &str = "NEXDB_QUEUE_CAPACITY";
pub const API_KEY_VAR: &str = "NEXDB_API_KEY";

/// Which storage backend to persist to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageKind {
    /// Volatile in-process storage. Nothing survives a restart.
    #[default]
    Memory,
    /// Amazon S3 object storage.
    AwsS3,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::Memory => "memory",
            StorageKind::AwsS3 => "aws-s3",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKind {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(StorageKind::Memory),
            "aws-s3" => Ok(StorageKind::AwsS3),
            other => Err(DatabaseError::UnknownStorageKind(other.to_string())),
        }
    }
}

/// Storage backend selection and its parameters.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    pub kind: StorageKind,
    /// When set, document bodies are encrypted at rest.
    pub encryption_key: Option<EncryptionKey>,
    pub region: Option<String>,
    pub bucket: Option<String>,
}

impl StorageConfig {
    pub fn memory() -> Self {
        Self::default()
    }

    pub fn with_encryption_key(mut self, key: EncryptionKey) -> Self {
        self.encryption_key = Some(key);
        self
    }
}

/// Everything needed to open a database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub storage: StorageConfig,
    pub queue_capacity: usize,
    /// Key stored on first start when no API keys exist yet.
    pub api_key: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            api_key: None,
        }
    }
}

impl DatabaseConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> DatabaseResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to its
    /// value. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// - [`DatabaseError::UnknownStorageKind`] for an unrecognised driver name.
    /// - [`DatabaseError::InvalidEncryptionKey`] for a key that is not 32 bytes.
    /// - [`DatabaseError::Configuration`] for a missing bucket or a bad capacity.
    pub fn from_lookup<F>(lookup: F) -> DatabaseResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let kind = match lookup(STORAGE_DRIVER_VAR) {
            Some(driver) => driver.parse()?,
            None => StorageKind::default(),
        };

        let encryption_key = lookup(ENCRYPTION_KEY_VAR)
            .map(|key| EncryptionKey::new(key.as_bytes()))
            .transpose()?;

        let bucket = lookup(BUCKET_VAR);
        if kind == StorageKind::AwsS3 && bucket.is_none() {
            return Err(DatabaseError::Configuration(format!(
                "{BUCKET_VAR} must be set when {STORAGE_DRIVER_VAR} is {kind}"
            )));
        }

        let queue_capacity = match lookup(QUEUE_CAPACITY_VAR) {
            Some(capacity) => match capacity.parse::<usize>() {
                Ok(capacity) if capacity > 0 => capacity,
                _ => {
                    return Err(DatabaseError::Configuration(format!(
                        "{QUEUE_CAPACITY_VAR} must be a positive integer, got {capacity:?}"
                    )));
                }
            },
            None => DEFAULT_QUEUE_CAPACITY,
        };

        Ok(Self {
            storage: StorageConfig {
                kind,
                encryption_key,
                region: lookup(REGION_VAR),
                bucket,
            },
            queue_capacity,
            api_key: lookup(API_KEY_VAR),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> DatabaseResult<DatabaseConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DatabaseConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_to_plaintext_memory() {
        let config = config(&[]).unwrap();

        assert_eq!(config.storage.kind, StorageKind::Memory);
        assert!(config.storage.encryption_key.is_none());
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn reads_object_storage_settings() {
        let config = config(&[
            (STORAGE_DRIVER_VAR, "aws-s3"),
            (REGION_VAR, "eu-west-2"),
            (BUCKET_VAR, "documents"),
            (ENCRYPTION_KEY_VAR, "0123456789abcdef0123456789abcdef"),
            (QUEUE_CAPACITY_VAR, "8"),
            (API_KEY_VAR, "secret"),
        ])
        .unwrap();

        assert_eq!(config.storage.kind, StorageKind::AwsS3);
        assert_eq!(config.storage.region.as_deref(), Some("eu-west-2"));
        assert_eq!(config.storage.bucket.as_deref(), Some("documents"));
        assert!(config.storage.encryption_key.is_some());
        assert_eq!(config.queue_capacity, 8);
        assert_eq!(config.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn unknown_driver_is_fatal() {
        let err = config(&[(STORAGE_DRIVER_VAR, "postgres")]).unwrap_err();
        assert!(matches!(err, DatabaseError::UnknownStorageKind(name) if name == "postgres"));
    }

    #[test]
    fn short_encryption_key_is_fatal() {
        let err = config(&[(ENCRYPTION_KEY_VAR, "too-short")]).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEncryptionKey { expected: 32, actual: 9 }));
    }

    #[test]
    fn object_storage_requires_a_bucket() {
        let err = config(&[(STORAGE_DRIVER_VAR, "aws-s3"), (BUCKET_VAR, "")]).unwrap_err();
        assert!(matches!(err, DatabaseError::Configuration(_)));
    }

    #[test]
    fn rejects_zero_capacity() {
        let err = config(&[(QUEUE_CAPACITY_VAR, "0")]).unwrap_err();
        assert!(matches!(err, DatabaseError::Configuration(_)));
    }

    #[test]
    fn memory_storage_with_a_key() {
        let key = EncryptionKey::new(b"0123456789abcdef0123456789abcdef").unwrap();
        let storage = StorageConfig::memory().with_encryption_key(key);

        assert_eq!(storage.kind, StorageKind::Memory);
        assert!(storage.encryption_key.is_some());
        assert!(storage.bucket.is_none());
    }

    #[test]
    fn storage_kind_round_trips_through_its_name() {
        for kind in [StorageKind::Memory, StorageKind::AwsS3] {
            assert_eq!(kind.as_str().parse::<StorageKind>().unwrap(), kind);
        }
    }
}
