//! # Keyward Store
//!
//! The collaborators Keyward's workflows talk to, behind async traits:
//!
//! - [`KeyStore`] - device-local key-pair material, keyed by address
//! - [`BlobStore`] - content-addressed storage for encrypted envelopes
//! - [`Ledger`] - identity registry, file records and permission requests
//!
//! ## Implementations
//!
//! - [`SqliteKeyStore`] - durable key store with versioned migrations
//! - [`MemoryKeyStore`] - in-memory key store for tests
//! - [`FsBlobStore`] - blobs as files in a directory
//! - [`MemoryBlobStore`] - in-memory blobs, with a corruption hook for tests
//! - [`MemoryLedger`] - in-memory ledger enforcing the registry and
//!   permission rules
//!
//! ## Usage
//!
//! ```rust,no_run
//! use keyward_store::{KeyStore, SqliteKeyStore};
//! use keyward_core::Address;
//!
//! async fn example() {
//!     let keys = SqliteKeyStore::open("keys.db").unwrap();
//!     let material = keys.get(&Address::from("alice")).await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **No partial writes**: a ledger write that errors changed nothing
//! - **Immutable blobs**: no delete or update primitive
//! - **Atomic key replacement**: `KeyStore::put` swaps the whole entry

pub mod error;
pub mod fs;
pub mod ledger;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{LedgerError, LedgerResult, Result, StorageError, StorageResult, StoreError};
pub use fs::FsBlobStore;
pub use ledger::MemoryLedger;
pub use memory::{content_address, MemoryBlobStore, MemoryKeyStore};
pub use sqlite::SqliteKeyStore;
pub use traits::{BlobStore, KeyStore, Ledger};
