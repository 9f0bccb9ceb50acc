//! Filesystem blob store.
//!
//! Each blob is a file named by its content address under one directory.
//! Writes go to a temporary file with a name unique to the write, then are
//! renamed into place.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use keyward_core::StorageRef;

use crate::error::{StorageError, StorageResult};
use crate::memory::content_address;
use crate::traits::BlobStore;

/// Content-addressed blob store rooted at a directory.
pub struct FsBlobStore {
    root: PathBuf,
    /// Distinguishes temporary files of concurrent writes.
    next_tmp: AtomicU64,
}

impl FsBlobStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl AsRef<Path>) -> StorageResult<Self> {
        let root = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            next_tmp: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the blob behind `reference`.
    ///
    /// References are lowercase hex; anything else could escape the root
    /// directory and is rejected.
    fn blob_path(&self, reference: &StorageRef) -> StorageResult<PathBuf> {
        let name = reference.as_str();
        let valid = !name.is_empty()
            && name
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !valid {
            return Err(StorageError::NotFound(reference.clone()));
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, bytes: Bytes) -> StorageResult<StorageRef> {
        let reference = content_address(&bytes);
        let path = self.blob_path(&reference)?;

        if tokio::fs::try_exists(&path).await? {
            return Ok(reference);
        }

        let n = self.next_tmp.fetch_add(1, Ordering::Relaxed);
        let tmp = self
            .root
            .join(format!("{}.{}-{}.tmp", reference.as_str(), std::process::id(), n));
        tokio::fs::write(&tmp, &bytes).await?;

        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            // Lost a race with a writer of the same content.
            let _ = tokio::fs::remove_file(&tmp).await;
            if !tokio::fs::try_exists(&path).await? {
                return Err(e.into());
            }
        }

        debug!(storage_ref = %reference, bytes = bytes.len(), "blob written");
        Ok(reference)
    }

    async fn get(&self, reference: &StorageRef) -> StorageResult<Bytes> {
        let path = self.blob_path(reference)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Bytes::from(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(reference.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();
        assert_eq!(store.root(), dir.path());

        let reference = store.put(Bytes::from_static(b"envelope")).await.unwrap();
        assert_eq!(reference, content_address(b"envelope"));
        assert!(dir.path().join(reference.as_str()).exists());
        assert_eq!(store.get(&reference).await.unwrap(), Bytes::from_static(b"envelope"));
    }

    #[tokio::test]
    async fn test_reopen_reads_existing() {
        let dir = tempfile::tempdir().unwrap();
        let reference = {
            let store = FsBlobStore::open(dir.path()).await.unwrap();
            store.put(Bytes::from_static(b"kept")).await.unwrap()
        };

        let store = FsBlobStore::open(dir.path()).await.unwrap();
        assert_eq!(store.get(&reference).await.unwrap(), Bytes::from_static(b"kept"));
    }

    #[tokio::test]
    async fn test_missing_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();
        let reference = content_address(b"never written");
        assert!(matches!(
            store.get(&reference).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path().join("blobs")).await.unwrap();
        assert!(matches!(
            store.get(&StorageRef::new("../secret")).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_puts_of_same_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(FsBlobStore::open(dir.path()).await.unwrap());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.put(Bytes::from_static(b"same envelope")).await
            }));
        }

        let expected = content_address(b"same envelope");
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), expected);
        }

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![expected.as_str().to_string()]);
        assert_eq!(store.get(&expected).await.unwrap(), Bytes::from_static(b"same envelope"));
    }
}
