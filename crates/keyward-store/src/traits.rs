//! Collaborator traits: the abstract interfaces to the local key store,
//! blob storage and the ledger.
//!
//! Workflows only see these traits, so every collaborator can be swapped for
//! an in-memory implementation in tests.

use async_trait::async_trait;
use bytes::Bytes;

use keyward_core::{
    Address, ContentHash, EncryptedFile, FileEntry, FileId, GrantedKey, Identity,
    PermissionRequest, RequestId, StorageRef, WrappedKey,
};

use crate::error::{LedgerResult, Result, StorageResult};

/// Device-local storage for key-pair material, keyed by identity address.
///
/// Private to the running device; never synchronized. Implementations must
/// make `put` atomic: a reader sees either the previous material or the new
/// material, never a mix.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Store material for `address`, replacing any existing entry.
    async fn put(&self, address: &Address, material: &str) -> Result<()>;

    /// Load material for `address`, if any was stored.
    async fn get(&self, address: &Address) -> Result<Option<String>>;
}

/// Content-addressable blob storage.
///
/// There is no delete or update primitive: a blob, once written, is
/// immutable.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes and return their reference.
    async fn put(&self, bytes: Bytes) -> StorageResult<StorageRef>;

    /// Fetch the bytes stored under `reference`.
    async fn get(&self, reference: &StorageRef) -> StorageResult<Bytes>;
}

/// The coordination ledger: identity registry, file records and permission
/// requests.
///
/// Everything on the ledger is public. Writes are transactional; a write that
/// returns an error left no partial effect.
///
/// # Delegated Invariants
///
/// - The address to public key binding returned by [`Ledger::resolve_public_key`]
///   is authoritative. Callers do not re-validate it.
/// - At most one approval succeeds per request, and only the owner of the
///   target file can approve. Callers do not implement compare-and-swap.
#[async_trait]
pub trait Ledger: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Registry
    // ─────────────────────────────────────────────────────────────────────────

    /// Register an identity and publish its public key.
    async fn register_identity(&self, identity: Identity) -> LedgerResult<()>;

    /// Look up a registered identity.
    async fn identity(&self, address: &Address) -> LedgerResult<Option<Identity>>;

    /// Resolve the published public key (JWK text) of an identity.
    async fn resolve_public_key(&self, address: &Address) -> LedgerResult<String>;

    // ─────────────────────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────────────────────

    /// Record a new file and return its ID.
    async fn record_file(&self, file: EncryptedFile) -> LedgerResult<FileId>;

    /// Get a recorded file.
    async fn get_file(&self, id: &FileId) -> LedgerResult<EncryptedFile>;

    /// List the files owned by `owner`, in recording order.
    async fn files_by_owner(&self, owner: &Address) -> LedgerResult<Vec<FileEntry>>;

    /// Find one of `owner`'s files by content hash (most recent first).
    async fn find_file(
        &self,
        owner: &Address,
        content_hash: &ContentHash,
    ) -> LedgerResult<Option<FileEntry>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Permission requests
    // ─────────────────────────────────────────────────────────────────────────

    /// Open a pending request by `requester` for `file_id`.
    async fn create_request(&self, requester: &Address, file_id: &FileId)
        -> LedgerResult<RequestId>;

    /// Pending requests targeting files owned by `owner`.
    async fn list_pending_requests(&self, owner: &Address)
        -> LedgerResult<Vec<PermissionRequest>>;

    /// All requests made by `requester`, in creation order.
    async fn requests_by(&self, requester: &Address) -> LedgerResult<Vec<PermissionRequest>>;

    /// Approve a pending request, attaching the re-wrapped key.
    ///
    /// `approver` is the transaction sender and must own the target file.
    async fn approve_request(
        &self,
        approver: &Address,
        request_id: &RequestId,
        wrapped: WrappedKey,
    ) -> LedgerResult<()>;

    /// The key granted through a request, if it has been approved.
    async fn granted_key(&self, request_id: &RequestId) -> LedgerResult<Option<GrantedKey>>;
}
