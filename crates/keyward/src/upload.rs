//! Upload: encrypt a file for its owner and record it on the ledger.

use bytes::Bytes;
use tracing::{debug, info};

use keyward_core::{
    Address, ContentHash, EncryptedFile, EnvelopeCipher, FileId, KeyWrapper, StorageRef,
    StoredEnvelope,
};
use keyward_store::{BlobStore, Ledger};

use crate::config::VaultConfig;
use crate::error::{Result, VaultError};
use crate::keys::KeyPairManager;

/// A file to upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadRequest {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// What an upload produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub file_id: FileId,
    pub storage_ref: StorageRef,
    pub content_hash: ContentHash,
}

/// Encrypts a file under a fresh content key and records it.
///
/// One storage write, then one ledger write. A failure at any step aborts
/// the upload; a blob written before a failed ledger write is unreachable.
/// Retrying runs the whole workflow again with a new key.
pub struct UploadWorkflow<'a> {
    pub keys: &'a KeyPairManager,
    pub storage: &'a dyn BlobStore,
    pub ledger: &'a dyn Ledger,
    pub config: &'a VaultConfig,
}

impl UploadWorkflow<'_> {
    pub async fn run(&self, owner: &Address, request: UploadRequest) -> Result<UploadReceipt> {
        if let Some(limit) = self.config.max_file_size {
            if request.bytes.len() > limit {
                return Err(VaultError::FileTooLarge {
                    size: request.bytes.len(),
                    limit,
                });
            }
        }

        let pair = self.keys.require(owner).await?;

        let (body, wrapped_key_for_owner, content_hash) = {
            let key = EnvelopeCipher::generate_symmetric_key();
            let envelope = StoredEnvelope::seal(&request.bytes, &key)?;
            let wrapped = KeyWrapper::wrap(&key, &pair.public)?;
            let hash = EnvelopeCipher::content_hash(&request.bytes);
            (envelope.to_json_bytes()?, wrapped, hash)
        };

        let storage_ref = self.storage.put(Bytes::from(body)).await?;
        debug!(owner = %owner, storage_ref = %storage_ref, "envelope stored");

        let file_id = self
            .ledger
            .record_file(EncryptedFile {
                owner: owner.clone(),
                content_hash: content_hash.clone(),
                mime_type: request.mime_type,
                storage_ref: storage_ref.clone(),
                wrapped_key_for_owner,
                file_name: request.file_name,
            })
            .await?;

        info!(
            owner = %owner,
            file_id = %file_id,
            bytes = request.bytes.len(),
            "file uploaded"
        );

        Ok(UploadReceipt {
            file_id,
            storage_ref,
            content_hash,
        })
    }
}
