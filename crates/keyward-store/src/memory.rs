//! In-memory key store and blob store.
//!
//! Same semantics as the durable backends, no persistence. Used by tests and
//! by the testkit's network fixture.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use bytes::Bytes;

use keyward_core::{Address, StorageRef};

use crate::error::{Result, StorageError, StorageResult};
use crate::traits::{BlobStore, KeyStore};

/// Content address of a blob: BLAKE3 of the stored bytes, hex.
pub fn content_address(bytes: &[u8]) -> StorageRef {
    StorageRef::new(blake3::hash(bytes).to_hex().to_string())
}

/// In-memory key store.
///
/// All material is lost when the store is dropped.
#[derive(Default)]
pub struct MemoryKeyStore {
    entries: RwLock<HashMap<Address, String>>,
}

impl MemoryKeyStore {
    /// Create a new empty key store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn put(&self, address: &Address, material: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(address.clone(), material.to_owned());
        Ok(())
    }

    async fn get(&self, address: &Address) -> Result<Option<String>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(address).cloned())
    }
}

/// In-memory content-addressed blob store.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<StorageRef, Bytes>>,
}

impl MemoryBlobStore {
    /// Create a new empty blob store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite the bytes behind an existing reference.
    ///
    /// Not reachable through [`BlobStore`]; this simulates a storage node
    /// serving corrupted or malicious content. Returns `false` if the
    /// reference is unknown.
    pub fn corrupt(&self, reference: &StorageRef, bytes: Bytes) -> bool {
        let mut blobs = self.blobs.write().unwrap_or_else(PoisonError::into_inner);
        match blobs.get_mut(reference) {
            Some(slot) => {
                *slot = bytes;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, bytes: Bytes) -> StorageResult<StorageRef> {
        let reference = content_address(&bytes);
        let mut blobs = self.blobs.write().unwrap_or_else(PoisonError::into_inner);
        blobs.entry(reference.clone()).or_insert(bytes);
        Ok(reference)
    }

    async fn get(&self, reference: &StorageRef) -> StorageResult<Bytes> {
        let blobs = self.blobs.read().unwrap_or_else(PoisonError::into_inner);
        blobs
            .get(reference)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(reference.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_key_store_put_get() {
        let store = MemoryKeyStore::new();
        let alice = Address::from("alice");

        assert!(store.get(&alice).await.unwrap().is_none());

        store.put(&alice, "first").await.unwrap();
        assert_eq!(store.get(&alice).await.unwrap().as_deref(), Some("first"));

        store.put(&alice, "second").await.unwrap();
        assert_eq!(store.get(&alice).await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_key_store_isolates_addresses() {
        let store = MemoryKeyStore::new();
        store.put(&Address::from("alice"), "a").await.unwrap();
        assert!(store.get(&Address::from("bob")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blob_put_get() {
        let store = MemoryBlobStore::new();
        let reference = store.put(Bytes::from_static(b"ciphertext")).await.unwrap();

        assert_eq!(reference, content_address(b"ciphertext"));
        assert_eq!(store.get(&reference).await.unwrap(), Bytes::from_static(b"ciphertext"));
    }

    #[tokio::test]
    async fn test_blob_put_is_idempotent() {
        let store = MemoryBlobStore::new();
        let r1 = store.put(Bytes::from_static(b"same")).await.unwrap();
        let r2 = store.put(Bytes::from_static(b"same")).await.unwrap();
        assert_eq!(r1, r2);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_blob_missing() {
        let store = MemoryBlobStore::new();
        let result = store.get(&StorageRef::new("nope")).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_corrupt_replaces_bytes() {
        let store = MemoryBlobStore::new();
        let reference = store.put(Bytes::from_static(b"original")).await.unwrap();

        assert!(store.corrupt(&reference, Bytes::from_static(b"tampered")));
        assert_eq!(store.get(&reference).await.unwrap(), Bytes::from_static(b"tampered"));
        assert!(!store.corrupt(&StorageRef::new("unknown"), Bytes::new()));
    }
}
