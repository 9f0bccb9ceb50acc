//! Error types for Keyward core primitives.

use thiserror::Error;

/// Errors raised by the cryptographic and encoding primitives.
///
/// Messages never include key material or plaintext.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The entropy source or RSA backend failed while generating a key.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Authenticated decryption failed: tampered data or the wrong key.
    #[error("integrity check failed")]
    Integrity,

    /// A wrapped key could not be opened with the given private key.
    #[error("unwrap failed: {0}")]
    Unwrap(String),

    /// Key material is structurally invalid.
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    /// A wire format could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Encoding(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
