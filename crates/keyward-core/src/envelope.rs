//! Stored ciphertext envelope.
//!
//! What the storage collaborator holds for a file: a single JSON object
//! `{"ciphertext": <base64>, "nonce": <base64>}`. It contains nothing that
//! identifies the key, the owner or the plaintext.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::cipher::{EncryptionNonce, EnvelopeCipher, SymmetricContentKey};
use crate::error::{CoreError, Result};

/// An encrypted file body as written to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEnvelope {
    /// AES-GCM ciphertext including the authentication tag.
    #[serde(with = "base64_bytes")]
    pub ciphertext: Vec<u8>,

    /// Nonce used for this encryption.
    #[serde(with = "base64_bytes")]
    pub nonce: Vec<u8>,
}

impl StoredEnvelope {
    /// Encrypt `plaintext` under `key` into a new envelope.
    pub fn seal(plaintext: &[u8], key: &SymmetricContentKey) -> Result<Self> {
        let (ciphertext, nonce) = EnvelopeCipher::encrypt(plaintext, key)?;
        Ok(Self {
            ciphertext,
            nonce: nonce.as_bytes().to_vec(),
        })
    }

    /// Decrypt and authenticate the envelope.
    pub fn open(&self, key: &SymmetricContentKey) -> Result<Vec<u8>> {
        let nonce = EncryptionNonce::from_slice(&self.nonce)?;
        EnvelopeCipher::decrypt(&self.ciphertext, &nonce, key)
    }

    /// Serialize to the JSON bytes handed to storage.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| CoreError::Encoding(e.to_string()))
    }

    /// Parse JSON bytes fetched from storage.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| CoreError::Encoding(e.to_string()))
    }
}

mod base64_bytes {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_roundtrip() {
        let key = EnvelopeCipher::generate_symmetric_key();
        let envelope = StoredEnvelope::seal(b"hello, encrypted world!", &key).unwrap();
        assert_eq!(envelope.open(&key).unwrap(), b"hello, encrypted world!");
    }

    #[test]
    fn test_json_shape() {
        let key = EnvelopeCipher::generate_symmetric_key();
        let envelope = StoredEnvelope::seal(b"test", &key).unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&envelope.to_json_bytes().unwrap()).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(
            STANDARD.decode(object["nonce"].as_str().unwrap()).unwrap().len(),
            12
        );

        let recovered = StoredEnvelope::from_json_bytes(&envelope.to_json_bytes().unwrap()).unwrap();
        assert_eq!(envelope, recovered);
    }

    #[test]
    fn test_wrong_key_fails() {
        let key1 = EnvelopeCipher::generate_symmetric_key();
        let key2 = EnvelopeCipher::generate_symmetric_key();
        let envelope = StoredEnvelope::seal(b"secret", &key1).unwrap();
        assert!(matches!(envelope.open(&key2), Err(CoreError::Integrity)));
    }

    #[test]
    fn test_short_nonce_is_integrity_error() {
        let key = EnvelopeCipher::generate_symmetric_key();
        let mut envelope = StoredEnvelope::seal(b"secret", &key).unwrap();
        envelope.nonce.pop();
        assert!(matches!(envelope.open(&key), Err(CoreError::Integrity)));
    }

    #[test]
    fn test_garbage_is_encoding_error() {
        assert!(matches!(
            StoredEnvelope::from_json_bytes(b"{\"ciphertext\": 5}"),
            Err(CoreError::Encoding(_))
        ));
        assert!(matches!(
            StoredEnvelope::from_json_bytes(b"{\"ciphertext\": \"!!\", \"nonce\": \"\"}"),
            Err(CoreError::Encoding(_))
        ));
    }
}
