//! # Keyward
//!
//! Envelope-encrypted file sharing with owner-approved key rewrapping.
//!
//! A data owner stores a file so that only parties they approve can read
//! it. Neither the blob storage nor the coordinating ledger ever sees
//! plaintext or a raw content key.
//!
//! ## Overview
//!
//! - [`Vault`] - one identity's handle: register, upload, request, approve,
//!   retrieve
//! - [`KeyPairManager`] - generates and persists the identity's RSA key pair
//! - [`UploadWorkflow`], [`GrantWorkflow`], [`RetrieveWorkflow`] - the three
//!   protocol workflows the vault runs
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use keyward::{UploadRequest, Vault, VaultConfig};
//! use keyward_core::{Address, Role};
//! use keyward_store::{MemoryBlobStore, MemoryLedger, SqliteKeyStore};
//!
//! async fn example() -> keyward::Result<()> {
//!     let ledger = Arc::new(MemoryLedger::new());
//!     let storage = Arc::new(MemoryBlobStore::new());
//!     let keys = Arc::new(SqliteKeyStore::open("alice-keys.db")?);
//!
//!     let alice = Vault::new(Address::from("alice"), keys, storage, ledger, VaultConfig::default());
//!     alice.register(Role::User).await?;
//!
//!     let receipt = alice
//!         .upload(UploadRequest::new("notes.txt", "text/plain", b"hello".to_vec()))
//!         .await?;
//!     let file = alice.retrieve(&receipt.file_id).await?;
//!     assert_eq!(file.bytes, b"hello");
//!     Ok(())
//! }
//! ```
//!
//! ## Guarantees
//!
//! - **Fail closed**: every workflow either completes or aborts; decryption
//!   never returns unauthenticated bytes
//! - **Transient keys**: raw content keys live only inside a workflow call
//!   and are wiped on drop
//! - **Permanent grants**: access once approved cannot be revoked

pub mod config;
pub mod error;
pub mod grant;
pub mod keys;
pub mod retrieve;
pub mod upload;
pub mod vault;

pub use config::VaultConfig;
pub use error::{ErrorClass, Result, VaultError};
pub use grant::GrantWorkflow;
pub use keys::KeyPairManager;
pub use retrieve::{RetrieveWorkflow, RetrievedFile};
pub use upload::{UploadReceipt, UploadRequest, UploadWorkflow};
pub use vault::{PendingRequest, Vault};
