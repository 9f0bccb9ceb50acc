//! Error types for Keyward workflows.

use keyward_core::{Address, CoreError, FileId, RequestId};
use keyward_store::{LedgerError, StorageError, StoreError};
use thiserror::Error;

/// Errors that can occur during vault operations.
///
/// No variant carries key material or plaintext.
#[derive(Debug, Error)]
pub enum VaultError {
    /// No key pair exists locally for this address.
    #[error("{0} is not registered on this device")]
    NotRegistered(Address),

    /// Key generation failed; the operation may be retried.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Authenticated decryption or the content hash check failed.
    #[error("integrity check failed: data was tampered with or the key is wrong")]
    Integrity,

    /// A wrapped key could not be opened with the caller's private key.
    #[error("unwrap failed: {0}")]
    Unwrap(String),

    /// The caller holds no wrapped key for this file.
    #[error("{address} has no access to file {file_id}")]
    NoAccess { address: Address, file_id: FileId },

    /// The caller does not own the file.
    #[error("{address} does not own file {file_id}")]
    NotOwner { address: Address, file_id: FileId },

    /// The request is not pending for this caller.
    #[error("request {0} is not pending for this owner")]
    RequestNotPending(RequestId),

    /// Input exceeds the configured size limit.
    #[error("file of {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: usize, limit: usize },

    /// Stored or published key material could not be parsed.
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// A wire format could not be encoded.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Local key store error.
    #[error("key store error: {0}")]
    KeyStore(#[from] StoreError),

    /// Blob storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Ledger error, including reverted transactions.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl From<CoreError> for VaultError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::KeyGeneration(msg) => VaultError::KeyGeneration(msg),
            CoreError::Integrity => VaultError::Integrity,
            CoreError::Unwrap(msg) => VaultError::Unwrap(msg),
            CoreError::InvalidKey(msg) => VaultError::InvalidKeyMaterial(msg),
            CoreError::Encoding(msg) => VaultError::Encoding(msg),
        }
    }
}

/// Coarse failure category, for callers that only need to tell the user
/// what kind of thing went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Recoverable by registering.
    NotRegistered,
    /// Transient; retry.
    KeyGeneration,
    /// Tampering or a wrong key. Never retried with the same inputs.
    Integrity,
    /// Key-store corruption or a counterparty protocol violation.
    Unwrap,
    /// The caller is not allowed to do this.
    AccessDenied,
    /// The request could not be accepted as given.
    InvalidInput,
    /// A collaborator failed; the operation had no partial effect.
    Collaborator,
}

impl VaultError {
    /// The coarse category of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            VaultError::NotRegistered(_) => ErrorClass::NotRegistered,
            VaultError::KeyGeneration(_) => ErrorClass::KeyGeneration,
            VaultError::Integrity => ErrorClass::Integrity,
            VaultError::Unwrap(_) => ErrorClass::Unwrap,
            VaultError::NoAccess { .. } | VaultError::NotOwner { .. } => ErrorClass::AccessDenied,
            VaultError::RequestNotPending(_)
            | VaultError::FileTooLarge { .. }
            | VaultError::InvalidKeyMaterial(_)
            | VaultError::Encoding(_) => ErrorClass::InvalidInput,
            VaultError::KeyStore(_) | VaultError::Storage(_) | VaultError::Ledger(_) => {
                ErrorClass::Collaborator
            }
        }
    }
}

/// Result type for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
