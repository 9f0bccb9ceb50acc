//! Identity key-pair management.
//!
//! The [`KeyPairManager`] is the only reader and writer of the local key
//! store. A key pair is generated fully in memory and committed with one
//! `KeyStore::put`, so an interrupted registration leaves either no entry
//! or a complete one.

use std::sync::Arc;

use tracing::{debug, info};
use zeroize::Zeroizing;

use keyward_core::{Address, KeyPair, KeyPairMaterial};
use keyward_store::KeyStore;

use crate::error::{Result, VaultError};

/// Generates, persists and loads identity key pairs.
#[derive(Clone)]
pub struct KeyPairManager {
    store: Arc<dyn KeyStore>,
    rsa_bits: usize,
}

impl KeyPairManager {
    pub fn new(store: Arc<dyn KeyStore>, rsa_bits: usize) -> Self {
        Self { store, rsa_bits }
    }

    /// Generate a fresh key pair on the blocking pool.
    pub async fn generate(&self) -> Result<KeyPair> {
        let bits = self.rsa_bits;
        let pair = tokio::task::spawn_blocking(move || KeyPair::generate(bits))
            .await
            .map_err(|e| VaultError::KeyGeneration(format!("keygen task failed: {}", e)))??;
        debug!(bits, "key pair generated");
        Ok(pair)
    }

    /// Write `pair` as the key pair of `address`, replacing any existing one.
    ///
    /// There is no rotation: files wrapped for a replaced key become
    /// unreadable to this identity.
    pub async fn persist(&self, address: &Address, pair: &KeyPair) -> Result<()> {
        let material = Zeroizing::new(pair.to_material()?.to_json()?);
        self.store.put(address, &material).await?;
        Ok(())
    }

    /// Load the key pair of `address`, or `None` if it was never generated.
    pub async fn load(&self, address: &Address) -> Result<Option<KeyPair>> {
        let Some(material) = self.store.get(address).await? else {
            return Ok(None);
        };
        let material = Zeroizing::new(material);
        let parsed = KeyPairMaterial::from_json(&material)
            .and_then(|m| KeyPair::from_material(&m))
            .map_err(|e| VaultError::InvalidKeyMaterial(format!("stored key pair for {}: {}", address, e)))?;
        Ok(Some(parsed))
    }

    /// Generate a key pair and commit it with a single store write.
    pub async fn generate_and_persist(&self, address: &Address) -> Result<KeyPair> {
        let pair = self.generate().await?;
        self.persist(address, &pair).await?;
        info!(address = %address, "key pair created");
        Ok(pair)
    }

    /// Load the key pair of `address`, failing with
    /// [`VaultError::NotRegistered`] if there is none.
    pub async fn require(&self, address: &Address) -> Result<KeyPair> {
        self.load(address)
            .await?
            .ok_or_else(|| VaultError::NotRegistered(address.clone()))
    }
}
