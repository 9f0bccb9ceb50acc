//! Vault configuration.

use keyward_core::DEFAULT_RSA_BITS;

/// Configuration for a [`Vault`](crate::Vault).
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// RSA modulus size for newly generated identity keys. At least 2048.
    pub rsa_bits: usize,
    /// Compare the SHA-256 of decrypted plaintext with the recorded hash.
    pub verify_content_hash: bool,
    /// Reject uploads larger than this many bytes.
    pub max_file_size: Option<usize>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            rsa_bits: DEFAULT_RSA_BITS,
            verify_content_hash: true,
            max_file_size: None,
        }
    }
}
