//! Test fixtures and helpers.
//!
//! A [`TestNetwork`] is one in-memory ledger and blob store shared by any
//! number of parties, each with its own device-local key store.

use std::sync::Arc;

use bytes::Bytes;

use keyward::{UploadRequest, Vault, VaultConfig};
use keyward_core::{Address, Role, StorageRef, StoredEnvelope};
use keyward_store::{BlobStore, KeyStore, MemoryBlobStore, MemoryKeyStore, MemoryLedger};

/// Shared collaborators for multi-party scenarios.
pub struct TestNetwork {
    ledger: Arc<MemoryLedger>,
    storage: Arc<MemoryBlobStore>,
    config: VaultConfig,
}

impl TestNetwork {
    /// Create an empty network with default vault configuration.
    pub fn new() -> Self {
        Self::with_config(VaultConfig::default())
    }

    pub fn with_config(config: VaultConfig) -> Self {
        Self {
            ledger: Arc::new(MemoryLedger::new()),
            storage: Arc::new(MemoryBlobStore::new()),
            config,
        }
    }

    pub fn ledger(&self) -> &Arc<MemoryLedger> {
        &self.ledger
    }

    pub fn storage(&self) -> &Arc<MemoryBlobStore> {
        &self.storage
    }

    /// A party with a fresh in-memory key store. Not yet registered.
    pub fn party(&self, name: &str) -> Vault {
        self.party_with_keys(name, Arc::new(MemoryKeyStore::new()))
    }

    /// A party backed by the given key store.
    pub fn party_with_keys(&self, name: &str, key_store: Arc<dyn KeyStore>) -> Vault {
        Vault::new(
            Address::from(name),
            key_store,
            self.storage.clone(),
            self.ledger.clone(),
            self.config.clone(),
        )
    }

    /// A party that has registered as [`Role::User`].
    pub async fn registered(&self, name: &str) -> keyward::Result<Vault> {
        let vault = self.party(name);
        vault.register(Role::User).await?;
        Ok(vault)
    }

    /// Flip one bit of the ciphertext stored under `reference`, keeping the
    /// envelope well-formed. Returns `false` if there is nothing to tamper
    /// with.
    pub async fn tamper_ciphertext(&self, reference: &StorageRef, index: usize) -> bool {
        let Ok(blob) = self.storage.get(reference).await else {
            return false;
        };
        let Ok(mut envelope) = StoredEnvelope::from_json_bytes(&blob) else {
            return false;
        };
        if envelope.ciphertext.is_empty() {
            return false;
        }
        let i = index % envelope.ciphertext.len();
        envelope.ciphertext[i] ^= 0x01;

        match envelope.to_json_bytes() {
            Ok(bytes) => self.storage.corrupt(reference, Bytes::from(bytes)),
            Err(_) => false,
        }
    }
}

impl Default for TestNetwork {
    fn default() -> Self {
        Self::new()
    }
}

/// A plain-text upload.
pub fn text_upload(file_name: &str, text: &str) -> UploadRequest {
    UploadRequest::new(file_name, "text/plain", text.as_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_parties_share_ledger() {
        let network = TestNetwork::new();
        let alice = network.registered("alice").await.unwrap();
        let bob = network.party("bob");

        let receipt = alice.upload(text_upload("a.txt", "shared")).await.unwrap();
        let listed = bob.files_of(alice.address()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, receipt.file_id);
    }

    #[tokio::test]
    async fn test_tamper_unknown_reference() {
        let network = TestNetwork::new();
        assert!(!network.tamper_ciphertext(&StorageRef::new("00"), 0).await);
    }
}
