//! Wrapping content keys for a recipient.
//!
//! A wrapped key is the RSA-OAEP (SHA-256) encryption of the raw 32-byte
//! content key under the recipient's public key, carried as base64 text.
//! Unwrapping with the recipient's private key is the only way a content
//! key becomes usable again; there is no escrow path.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::rngs::OsRng;
use rsa::Oaep;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::cipher::SymmetricContentKey;
use crate::error::{CoreError, Result};
use crate::keypair::{PrivateKey, PublicKey};

/// A content key wrapped for one recipient, as base64 text.
///
/// Useless without the recipient's private key, so it is safe to publish.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WrappedKey(String);

impl WrappedKey {
    /// Wrap already-encoded base64 text, e.g. read back from the ledger.
    pub fn from_base64(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the raw OAEP ciphertext.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(&self.0)
            .map_err(|_| CoreError::Unwrap("wrapped key is not valid base64".into()))
    }
}

impl fmt::Debug for WrappedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WrappedKey({} chars)", self.0.len())
    }
}

/// Asymmetric wrap/unwrap of content keys.
pub struct KeyWrapper;

impl KeyWrapper {
    /// Encrypt the raw content key under `recipient`'s public key.
    pub fn wrap(key: &SymmetricContentKey, recipient: &PublicKey) -> Result<WrappedKey> {
        let ciphertext = recipient
            .inner()
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), key.as_bytes())
            .map_err(|e| CoreError::Encoding(format!("RSA-OAEP wrap failed: {}", e)))?;
        Ok(WrappedKey(STANDARD.encode(ciphertext)))
    }

    /// Recover the content key with the holder's own private key.
    ///
    /// Fails with [`CoreError::Unwrap`] when the private key does not match
    /// the wrapping public key or the ciphertext is malformed.
    pub fn unwrap(wrapped: &WrappedKey, own: &PrivateKey) -> Result<SymmetricContentKey> {
        let ciphertext = wrapped.to_bytes()?;
        let raw = Zeroizing::new(
            own.inner()
                .decrypt(Oaep::new::<Sha256>(), &ciphertext)
                .map_err(|_| CoreError::Unwrap("RSA-OAEP decryption failed".into()))?,
        );
        SymmetricContentKey::from_slice(&raw)
            .map_err(|_| CoreError::Unwrap(format!("unwrapped key has {} bytes", raw.len())))
    }
}
