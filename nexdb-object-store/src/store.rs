use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use object_store::{ObjectStore, PutPayload, aws::AmazonS3Builder};
use std::{fmt, sync::Arc};
use tracing::info;

use nexdb_core::{
    backend::{DocumentStream, StorageBackend, StorageBackendBuilder},
    codec::{DocumentCodec, EncryptionKey},
    config::StorageConfig,
    document::Document,
    error::{DatabaseError, DatabaseResult},
};

use crate::keys::object_key;

fn backend_error(err: object_store::Error) -> DatabaseError {
    DatabaseError::Backend(err.to_string())
}

/// Storage backend that keeps one object per document.
#[derive(Clone)]
pub struct ObjectStorage {
    store: Arc<dyn ObjectStore>,
    codec: DocumentCodec,
}

impl ObjectStorage {
    pub fn new(store: Arc<dyn ObjectStore>, codec: DocumentCodec) -> Self {
        Self { store, codec }
    }

    pub fn builder(bucket: &str) -> ObjectStorageBuilder {
        ObjectStorageBuilder::new(bucket)
    }
}

impl fmt::Debug for ObjectStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStorage")
            .field("store", &self.store.to_string())
            .field("codec", &self.codec)
            .finish()
    }
}

#[async_trait]
impl StorageBackend for ObjectStorage {
    async fn write(&self, document: &Document) -> DatabaseResult<()> {
        self.store
            .put(&object_key(document), PutPayload::from(self.codec.encode(document)?))
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn delete(&self, document: &Document) -> DatabaseResult<()> {
        match self.store.delete(&object_key(document)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(err) => Err(backend_error(err)),
        }
    }

    fn stream(&self) -> DocumentStream<'_> {
        self.store
            .list(None)
            .map_err(backend_error)
            .and_then(move |meta| async move {
                let body = self
                    .store
                    .get(&meta.location)
                    .await
                    .map_err(backend_error)?
                    .bytes()
                    .await
                    .map_err(backend_error)?;

                self.codec.decode(&body)
            })
            .boxed()
    }
}

/// Builder for an S3-backed [`ObjectStorage`].
///
/// Credentials and any setting not given here are taken from the standard `AWS_*`
/// environment variables.
#[derive(Debug, Default)]
pub struct ObjectStorageBuilder {
    bucket: Option<String>,
    region: Option<String>,
    encryption_key: Option<EncryptionKey>,
}

impl ObjectStorageBuilder {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: Some(bucket.to_string()),
            ..Self::default()
        }
    }

    /// Takes bucket, region and encryption key from a storage configuration.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            encryption_key: config.encryption_key.clone(),
        }
    }

    pub fn region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }

    pub fn encryption_key(mut self, key: EncryptionKey) -> Self {
        self.encryption_key = Some(key);
        self
    }
}

#[async_trait]
impl StorageBackendBuilder for ObjectStorageBuilder {
    type Backend = ObjectStorage;

    async fn build(self) -> DatabaseResult<Self::Backend> {
        let bucket = self
            .bucket
            .ok_or_else(|| DatabaseError::Configuration("object storage requires a bucket".into()))?;

        let mut s3 = AmazonS3Builder::from_env().with_bucket_name(&bucket);
        if let Some(region) = &self.region {
            s3 = s3.with_region(region);
        }

        let store = s3
            .build()
            .map_err(|e| DatabaseError::Configuration(e.to_string()))?;

        let codec = DocumentCodec::from_key(self.encryption_key.as_ref());
        info!(
            bucket = %bucket,
            region = self.region.as_deref(),
            encrypted = codec.is_encrypted(),
            "using s3 object storage"
        );

        Ok(ObjectStorage::new(Arc::new(store), codec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::{memory::InMemory, path::Path};

    const KEY: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn in_memory(codec: DocumentCodec) -> (Arc<InMemory>, ObjectStorage) {
        let objects = Arc::new(InMemory::new());
        let storage = ObjectStorage::new(objects.clone(), codec);
        (objects, storage)
    }

    async fn stored(storage: &ObjectStorage) -> Vec<Document> {
        storage.stream().try_collect().await.unwrap()
    }

    #[tokio::test]
    async fn write_puts_one_object_per_document() {
        let (objects, storage) = in_memory(DocumentCodec::plain());
        let doc = Document::builder().collection("users").field("name", "John").build();

        storage.write(&doc).await.unwrap();

        let location = Path::from(format!("users/{}", doc.id()));
        objects.head(&location).await.unwrap();
        assert_eq!(stored(&storage).await, vec![doc]);
    }

    #[tokio::test]
    async fn write_overwrites_the_same_key() {
        let (_, storage) = in_memory(DocumentCodec::plain());
        let first = Document::builder().collection("users").field("v", 1).build();
        let second = Document::builder()
            .id(first.id())
            .collection("users")
            .field("v", 2)
            .build();

        storage.write(&first).await.unwrap();
        storage.write(&second).await.unwrap();

        assert_eq!(stored(&storage).await, vec![second]);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_, storage) = in_memory(DocumentCodec::plain());
        let doc = Document::new("users");

        storage.write(&doc).await.unwrap();
        storage.delete(&doc.tombstone()).await.unwrap();
        storage.delete(&doc.tombstone()).await.unwrap();

        assert!(stored(&storage).await.is_empty());
    }

    #[tokio::test]
    async fn encrypted_objects_round_trip() {
        let key = EncryptionKey::new(KEY).unwrap();
        let (objects, storage) = in_memory(DocumentCodec::encrypted(&key));
        let doc = Document::builder().collection("secrets").field("pin", "4242").build();

        storage.write(&doc).await.unwrap();

        let body = objects
            .get(&object_key(&doc))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        assert!(!String::from_utf8_lossy(&body).contains("4242"));
        assert_eq!(stored(&storage).await, vec![doc]);

        let plain_reader = ObjectStorage::new(objects, DocumentCodec::plain());
        assert!(plain_reader.stream().try_collect::<Vec<_>>().await.is_err());
    }

    #[tokio::test]
    async fn builder_requires_a_bucket() {
        let err = ObjectStorageBuilder::from_config(&StorageConfig::default())
            .build()
            .await
            .unwrap_err();

        assert!(matches!(err, DatabaseError::Configuration(_)));
    }
}
