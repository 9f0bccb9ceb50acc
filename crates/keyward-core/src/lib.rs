//! # Keyward Core
//!
//! Pure primitives for Keyward: identifiers, ledger records, and the
//! envelope-encryption protocol.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Encryption Model
//!
//! Every file is encrypted with its own content key:
//!
//! 1. **Content Key**: a fresh AES-256-GCM key encrypts the file body
//! 2. **Wrapped Keys**: the content key is wrapped with RSA-OAEP (SHA-256)
//!    under each reader's public key
//!
//! Adding a reader only needs the content key re-wrapped, never the file
//! re-encrypted. The content hash (SHA-256 of the plaintext) identifies a
//! file's contents independently of any key.
//!
//! ## Key Types
//!
//! - [`KeyPair`] - an identity's RSA key pair, persisted as JWK material
//! - [`EnvelopeCipher`] / [`SymmetricContentKey`] - symmetric encryption
//! - [`KeyWrapper`] / [`WrappedKey`] - per-recipient key wrapping
//! - [`StoredEnvelope`] - the JSON body written to storage
//! - [`EncryptedFile`], [`PermissionRequest`], [`GrantedKey`] - ledger records

pub mod cipher;
pub mod envelope;
pub mod error;
pub mod keypair;
pub mod record;
pub mod types;
pub mod wrap;

pub use cipher::{EncryptionNonce, EnvelopeCipher, SymmetricContentKey, KEY_SIZE, NONCE_SIZE};
pub use envelope::StoredEnvelope;
pub use error::{CoreError, Result};
pub use keypair::{Jwk, KeyPair, KeyPairMaterial, PrivateKey, PublicKey, DEFAULT_RSA_BITS};
pub use record::{EncryptedFile, FileEntry, GrantedKey, PermissionRequest, RequestState};
pub use types::{Address, ContentHash, FileId, Identity, RequestId, Role, StorageRef};
pub use wrap::{KeyWrapper, WrappedKey};
