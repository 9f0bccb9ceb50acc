//! Error types for the collaborator interfaces.

use thiserror::Error;

use keyward_core::{Address, FileId, RequestId, StorageRef};

/// Errors from the local key store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A background task running a blocking store call failed.
    #[error("store task failed: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the blob storage collaborator.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No blob exists under this reference.
    #[error("blob not found: {0}")]
    NotFound(StorageRef),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the ledger collaborator.
///
/// A `Reverted` write had no effect at all.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No identity is registered under this address.
    #[error("unknown identity: {0}")]
    UnknownIdentity(Address),

    /// No file is recorded under this ID.
    #[error("file not found: {0}")]
    FileNotFound(FileId),

    /// No request exists with this ID.
    #[error("request not found: {0}")]
    RequestNotFound(RequestId),

    /// The transaction was rejected and left no trace.
    #[error("transaction reverted: {0}")]
    Reverted(String),
}

/// Result type for key store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Result type for blob storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Result type for ledger operations.
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
