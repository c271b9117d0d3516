//! Storage encoding for documents, with optional at-rest encryption.
//!
//! A document is stored as its JSON serialized form. When an [`EncryptionKey`] is
//! configured the JSON bytes are sealed with AES-256-GCM and stored as an envelope:
//!
//! ```text
//! +-------------------+-----------------------------------+
//! | nonce (12 bytes)  | ciphertext + auth tag (16 bytes)  |
//! +-------------------+-----------------------------------+
//! ```
//!
//! A new random nonce is drawn for every write.

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use std::fmt;

use crate::{
    document::Document,
    error::{DatabaseError, DatabaseResult},
};

/// Required key length for AES-256-GCM.
pub const KEY_SIZE: usize = 32;
/// Length of the nonce prefix in a sealed envelope.
pub const NONCE_SIZE: usize = 12;

/// Symmetric key material for at-rest encryption.
///
/// Construction validates the length, so holding an `EncryptionKey` means the key
/// is usable.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; KEY_SIZE]);

impl EncryptionKey {
    /// Validates and wraps raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidEncryptionKey`] unless `bytes` is exactly
    /// [`KEY_SIZE`] bytes long.
    pub fn new(bytes: &[u8]) -> DatabaseResult<Self> {
        let key = <[u8; KEY_SIZE]>::try_from(bytes).map_err(|_| {
            DatabaseError::InvalidEncryptionKey {
                expected: KEY_SIZE,
                actual: bytes.len(),
            }
        })?;

        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}

/// Encodes documents to storage bytes and back.
///
/// Both backends own a codec; it is the only place where serialization and
/// encryption happen.
#[derive(Clone, Default)]
pub struct DocumentCodec {
    cipher: Option<Aes256Gcm>,
}

impl DocumentCodec {
    /// A codec that stores plain JSON.
    pub fn plain() -> Self {
        Self { cipher: None }
    }

    /// A codec that seals every document with `key`.
    pub fn encrypted(key: &EncryptionKey) -> Self {
        Self {
            cipher: Some(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))),
        }
    }

    /// Builds a codec from an optional key.
    pub fn from_key(key: Option<&EncryptionKey>) -> Self {
        key.map(Self::encrypted).unwrap_or_default()
    }

    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    /// Serializes `document`, sealing it if the codec has a key.
    pub fn encode(&self, document: &Document) -> DatabaseResult<Vec<u8>> {
        let plaintext = serde_json::to_vec(document)?;

        let Some(cipher) = &self.cipher else {
            return Ok(plaintext);
        };

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_slice())
            .map_err(|e| DatabaseError::Encryption(e.to_string()))?;

        let mut envelope = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        envelope.extend_from_slice(&nonce);
        envelope.extend_from_slice(&ciphertext);

        Ok(envelope)
    }

    /// Opens and deserializes bytes produced by [`encode`](Self::encode).
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Decryption`] when the envelope is truncated, was
    /// sealed with another key, or has been tampered with, and
    /// [`DatabaseError::Serialization`] when the plaintext is not a document.
    pub fn decode(&self, bytes: &[u8]) -> DatabaseResult<Document> {
        let Some(cipher) = &self.cipher else {
            return Ok(serde_json::from_slice(bytes)?);
        };

        if bytes.len() < NONCE_SIZE {
            return Err(DatabaseError::Decryption(format!(
                "sealed document is {} bytes, shorter than the nonce",
                bytes.len()
            )));
        }

        let (nonce, ciphertext) = bytes.split_at(NONCE_SIZE);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| DatabaseError::Decryption(e.to_string()))?;

        Ok(serde_json::from_slice(&plaintext)?)
    }
}

impl fmt::Debug for DocumentCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentCodec")
            .field("encrypted", &self.is_encrypted())
            .finish()
    }
}
