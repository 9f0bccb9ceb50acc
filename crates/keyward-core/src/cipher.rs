//! Symmetric envelope cipher.
//!
//! Each file is encrypted with its own AES-256-GCM key. Because a key is
//! generated per file and used for exactly one encryption, nonce reuse under
//! the same key cannot happen; no usage tracking is needed.

use std::fmt;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CoreError, Result};
use crate::types::ContentHash;

/// AES-256 key size in bytes.
pub const KEY_SIZE: usize = 32;

/// AES-GCM nonce size in bytes.
pub const NONCE_SIZE: usize = 12;

/// AES-GCM authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// A single-use 256-bit content key.
///
/// Never serialized in raw form. The bytes are wiped on drop and `Debug`
/// does not print them.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SymmetricContentKey([u8; KEY_SIZE]);

impl SymmetricContentKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, rejecting anything that is not exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
            CoreError::InvalidKey(format!(
                "content key must be {} bytes, got {}",
                KEY_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SymmetricContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricContentKey([REDACTED])")
    }
}

/// A 96-bit AES-GCM nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionNonce(pub [u8; NONCE_SIZE]);

impl EncryptionNonce {
    /// Generate a fresh random nonce.
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create from a slice of any length.
    ///
    /// A nonce of the wrong length cannot have produced a valid tag, so it is
    /// reported as an integrity failure rather than an encoding error.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; NONCE_SIZE] = bytes.try_into().map_err(|_| CoreError::Integrity)?;
        Ok(Self(arr))
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

/// Authenticated symmetric encryption and content hashing.
pub struct EnvelopeCipher;

impl EnvelopeCipher {
    /// Generate a fresh content key from the OS entropy source.
    pub fn generate_symmetric_key() -> SymmetricContentKey {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        let key = SymmetricContentKey(bytes);
        bytes.zeroize();
        key
    }

    /// Encrypt `plaintext` under `key` with a freshly generated nonce.
    ///
    /// The returned ciphertext carries the 16-byte authentication tag.
    pub fn encrypt(
        plaintext: &[u8],
        key: &SymmetricContentKey,
    ) -> Result<(Vec<u8>, EncryptionNonce)> {
        let cipher = Aes256Gcm::new_from_slice(&key.0)
            .map_err(|e| CoreError::InvalidKey(e.to_string()))?;

        let nonce = EncryptionNonce::generate();
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce.0), plaintext)
            .map_err(|_| CoreError::Encoding("AES-GCM encryption failed".into()))?;

        Ok((ciphertext, nonce))
    }

    /// Decrypt and authenticate.
    ///
    /// Any tag mismatch is [`CoreError::Integrity`]; corrupted bytes are never
    /// returned.
    pub fn decrypt(
        ciphertext: &[u8],
        nonce: &EncryptionNonce,
        key: &SymmetricContentKey,
    ) -> Result<Vec<u8>> {
        if ciphertext.len() < TAG_SIZE {
            return Err(CoreError::Integrity);
        }

        let cipher = Aes256Gcm::new_from_slice(&key.0)
            .map_err(|e| CoreError::InvalidKey(e.to_string()))?;

        cipher
            .decrypt(Nonce::from_slice(&nonce.0), ciphertext)
            .map_err(|_| CoreError::Integrity)
    }

    /// SHA-256 of the plaintext as lowercase hex.
    pub fn content_hash(plaintext: &[u8]) -> ContentHash {
        ContentHash::from_hex(hex::encode(Sha256::digest(plaintext)))
    }
}
