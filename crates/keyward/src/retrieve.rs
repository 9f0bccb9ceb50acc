//! Retrieve: fetch, unwrap and decrypt a file for the caller.

use tracing::{debug, info, warn};

use keyward_core::{
    Address, EncryptedFile, EnvelopeCipher, FileId, KeyWrapper, StoredEnvelope, WrappedKey,
};
use keyward_store::{BlobStore, Ledger};

use crate::config::VaultConfig;
use crate::error::{Result, VaultError};
use crate::keys::KeyPairManager;

/// A decrypted file, ready for presentation.
#[derive(Clone, PartialEq, Eq)]
pub struct RetrievedFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for RetrievedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievedFile")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

pub struct RetrieveWorkflow<'a> {
    pub keys: &'a KeyPairManager,
    pub storage: &'a dyn BlobStore,
    pub ledger: &'a dyn Ledger,
    pub config: &'a VaultConfig,
}

impl RetrieveWorkflow<'_> {
    pub async fn run(&self, caller: &Address, file_id: &FileId) -> Result<RetrievedFile> {
        let file = self.ledger.get_file(file_id).await?;
        let pair = self.keys.require(caller).await?;
        let wrapped = self.resolve_wrapped_key(caller, file_id, &file).await?;

        let blob = self.storage.get(&file.storage_ref).await?;
        // A blob that is not a well-formed envelope has been tampered with.
        let envelope = StoredEnvelope::from_json_bytes(&blob).map_err(|_| VaultError::Integrity)?;

        let plaintext = {
            let key = KeyWrapper::unwrap(&wrapped, &pair.private)?;
            envelope.open(&key)?
        };

        if self.config.verify_content_hash
            && EnvelopeCipher::content_hash(&plaintext) != file.content_hash
        {
            warn!(file_id = %file_id, "decrypted content does not match recorded hash");
            return Err(VaultError::Integrity);
        }

        info!(caller = %caller, file_id = %file_id, bytes = plaintext.len(), "file retrieved");

        Ok(RetrievedFile {
            file_name: file.file_name,
            mime_type: file.mime_type,
            bytes: plaintext,
        })
    }

    /// The owner's copy for the owner, otherwise the key granted through
    /// the caller's approved request for this file.
    async fn resolve_wrapped_key(
        &self,
        caller: &Address,
        file_id: &FileId,
        file: &EncryptedFile,
    ) -> Result<WrappedKey> {
        if &file.owner == caller {
            return Ok(file.wrapped_key_for_owner.clone());
        }

        let approved = self
            .ledger
            .requests_by(caller)
            .await?
            .into_iter()
            .filter(|r| &r.file_id == file_id && !r.state.is_pending());

        for request in approved {
            if let Some(grant) = self.ledger.granted_key(&request.id).await? {
                debug!(caller = %caller, request_id = %request.id, "using granted key");
                return Ok(grant.wrapped_key_for_requester);
            }
        }

        Err(VaultError::NoAccess {
            address: caller.clone(),
            file_id: *file_id,
        })
    }
}
