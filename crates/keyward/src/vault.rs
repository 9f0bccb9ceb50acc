//! The Vault: one identity's handle onto the shared ledger and storage.

use std::sync::Arc;

use tracing::{info, warn};

use keyward_core::{
    Address, ContentHash, EncryptedFile, FileEntry, FileId, GrantedKey, Identity,
    PermissionRequest, RequestId, Role,
};
use keyward_store::{BlobStore, KeyStore, Ledger};

use crate::config::VaultConfig;
use crate::error::{Result, VaultError};
use crate::grant::GrantWorkflow;
use crate::keys::KeyPairManager;
use crate::retrieve::{RetrieveWorkflow, RetrievedFile};
use crate::upload::{UploadReceipt, UploadRequest, UploadWorkflow};

/// A pending request joined with the file it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub request: PermissionRequest,
    pub file: EncryptedFile,
}

/// A local identity bound to its key store and the shared collaborators.
///
/// Provides a unified API for:
/// - Registering the identity and publishing its public key
/// - Uploading files
/// - Listing and searching files
/// - Requesting, approving and using access grants
pub struct Vault {
    address: Address,
    keys: KeyPairManager,
    storage: Arc<dyn BlobStore>,
    ledger: Arc<dyn Ledger>,
    config: VaultConfig,
}

impl Vault {
    /// Create a vault for `address`.
    pub fn new(
        address: Address,
        key_store: Arc<dyn KeyStore>,
        storage: Arc<dyn BlobStore>,
        ledger: Arc<dyn Ledger>,
        config: VaultConfig,
    ) -> Self {
        Self {
            address,
            keys: KeyPairManager::new(key_store, config.rsa_bits),
            storage,
            ledger,
            config,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn keys(&self) -> &KeyPairManager {
        &self.keys
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────────

    /// Register this identity on the ledger.
    ///
    /// Idempotent: an identity the ledger already knows is returned as is.
    /// A key pair left behind by an earlier attempt that failed at the
    /// ledger is reused rather than replaced.
    pub async fn register(&self, role: Role) -> Result<Identity> {
        if let Some(existing) = self.ledger.identity(&self.address).await? {
            info!(address = %self.address, "already registered");
            if self.keys.load(&self.address).await?.is_none() {
                warn!(address = %self.address, "registered identity has no local key pair");
            }
            return Ok(existing);
        }

        let pair = match self.keys.load(&self.address).await? {
            Some(pair) => pair,
            None => self.keys.generate_and_persist(&self.address).await?,
        };

        let identity = Identity {
            address: self.address.clone(),
            public_key: pair.public.to_jwk_string()?,
            role,
        };
        self.ledger.register_identity(identity.clone()).await?;

        info!(address = %self.address, role = ?role, "identity registered");
        Ok(identity)
    }

    /// Whether a key pair exists locally for this identity.
    pub async fn has_local_keys(&self) -> Result<bool> {
        Ok(self.keys.load(&self.address).await?.is_some())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────────────────────

    /// Encrypt and upload a file owned by this identity.
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt> {
        UploadWorkflow {
            keys: &self.keys,
            storage: self.storage.as_ref(),
            ledger: self.ledger.as_ref(),
            config: &self.config,
        }
        .run(&self.address, request)
        .await
    }

    /// Files owned by `owner`, in upload order.
    pub async fn files_of(&self, owner: &Address) -> Result<Vec<FileEntry>> {
        Ok(self.ledger.files_by_owner(owner).await?)
    }

    /// The most recent of `owner`'s files with this content hash.
    pub async fn find_file(
        &self,
        owner: &Address,
        content_hash: &ContentHash,
    ) -> Result<Option<FileEntry>> {
        Ok(self.ledger.find_file(owner, content_hash).await?)
    }

    /// Fetch and decrypt a file this identity owns or was granted.
    pub async fn retrieve(&self, file_id: &FileId) -> Result<RetrievedFile> {
        RetrieveWorkflow {
            keys: &self.keys,
            storage: self.storage.as_ref(),
            ledger: self.ledger.as_ref(),
            config: &self.config,
        }
        .run(&self.address, file_id)
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Access Requests
    // ─────────────────────────────────────────────────────────────────────────

    /// Ask the owner of `file_id` for access.
    pub async fn request_access(&self, file_id: &FileId) -> Result<RequestId> {
        if self.ledger.identity(&self.address).await?.is_none() {
            return Err(VaultError::NotRegistered(self.address.clone()));
        }

        let request_id = self.ledger.create_request(&self.address, file_id).await?;
        info!(
            requester = %self.address,
            file_id = %file_id,
            request_id = %request_id,
            "access requested"
        );
        Ok(request_id)
    }

    /// Pending requests for this identity's files, with the file each targets.
    pub async fn pending_requests(&self) -> Result<Vec<PendingRequest>> {
        let requests = self.ledger.list_pending_requests(&self.address).await?;

        let mut pending = Vec::with_capacity(requests.len());
        for request in requests {
            let file = self.ledger.get_file(&request.file_id).await?;
            pending.push(PendingRequest { request, file });
        }
        Ok(pending)
    }

    /// Requests this identity has made, in creation order.
    pub async fn my_requests(&self) -> Result<Vec<PermissionRequest>> {
        Ok(self.ledger.requests_by(&self.address).await?)
    }

    /// Approve a pending request for one of this identity's files.
    pub async fn approve(&self, request_id: &RequestId) -> Result<GrantedKey> {
        GrantWorkflow {
            keys: &self.keys,
            ledger: self.ledger.as_ref(),
        }
        .approve(&self.address, request_id)
        .await
    }
}
