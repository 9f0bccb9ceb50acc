//! Records kept by the ledger: encrypted file metadata, permission requests
//! and the keys granted through them.
//!
//! All of these are public. None of them carries plaintext or a raw
//! content key.

use serde::{Deserialize, Serialize};

use crate::types::{Address, ContentHash, FileId, RequestId, StorageRef};
use crate::wrap::WrappedKey;

/// Metadata of an uploaded file. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedFile {
    pub owner: Address,
    pub content_hash: ContentHash,
    pub mime_type: String,
    pub storage_ref: StorageRef,
    pub wrapped_key_for_owner: WrappedKey,
    pub file_name: String,
}

/// A file record together with the ID the ledger assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub id: FileId,
    pub file: EncryptedFile,
}

/// Lifecycle of a permission request.
///
/// `Approved` is terminal. There is no rejected state: a request the owner
/// ignores simply stays pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestState {
    Pending,
    Approved,
}

impl RequestState {
    pub fn is_pending(self) -> bool {
        matches!(self, RequestState::Pending)
    }
}

/// A reader's request for access to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequest {
    pub id: RequestId,
    pub requester: Address,
    pub file_id: FileId,
    /// Owner of the target file at the time of the request.
    pub owner: Address,
    pub state: RequestState,
}

impl PermissionRequest {
    /// Create a new pending request.
    pub fn pending(id: RequestId, requester: Address, file_id: FileId, owner: Address) -> Self {
        Self {
            id,
            requester,
            file_id,
            owner,
            state: RequestState::Pending,
        }
    }

    /// Move to `Approved`. Returns false if the request was already approved.
    pub fn approve(&mut self) -> bool {
        if !self.state.is_pending() {
            return false;
        }
        self.state = RequestState::Approved;
        true
    }
}

/// The content key of a file re-wrapped for an approved requester.
///
/// Exists only for an approved request, at most once per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantedKey {
    pub request_id: RequestId,
    pub wrapped_key_for_requester: WrappedKey,
}
