//! In-memory ledger.
//!
//! Stands in for the registry and permissions contracts. Every write runs
//! its checks first and then mutates under a single write lock, so a
//! reverted write leaves the state exactly as it was.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use tracing::debug;

use keyward_core::{
    Address, ContentHash, EncryptedFile, FileEntry, FileId, GrantedKey, Identity,
    PermissionRequest, RequestId, WrappedKey,
};

use crate::error::{LedgerError, LedgerResult};
use crate::traits::Ledger;

/// In-memory ledger implementation.
#[derive(Default)]
pub struct MemoryLedger {
    inner: RwLock<LedgerState>,
}

#[derive(Default)]
struct LedgerState {
    identities: HashMap<Address, Identity>,

    /// Files indexed by ID.
    files: HashMap<FileId, EncryptedFile>,

    /// File IDs in recording order.
    file_order: Vec<FileId>,

    /// Requests indexed by ID.
    requests: HashMap<RequestId, PermissionRequest>,

    /// Request IDs in creation order.
    request_order: Vec<RequestId>,

    grants: HashMap<RequestId, GrantedKey>,

    /// Monotonic counter mixed into request IDs.
    next_request_seq: u64,
}

impl LedgerState {
    fn require_identity(&self, address: &Address) -> LedgerResult<()> {
        if self.identities.contains_key(address) {
            Ok(())
        } else {
            Err(LedgerError::UnknownIdentity(address.clone()))
        }
    }

    fn file(&self, id: &FileId) -> LedgerResult<&EncryptedFile> {
        self.files.get(id).ok_or(LedgerError::FileNotFound(*id))
    }

    fn entries<'a>(&'a self, ids: impl Iterator<Item = &'a FileId> + 'a) -> impl Iterator<Item = FileEntry> + 'a {
        ids.filter_map(|id| {
            self.files.get(id).map(|file| FileEntry {
                id: *id,
                file: file.clone(),
            })
        })
    }

    fn ordered_requests(&self) -> impl Iterator<Item = &PermissionRequest> {
        self.request_order
            .iter()
            .filter_map(|id| self.requests.get(id))
    }
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of recorded files.
    pub fn file_count(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).files.len()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn register_identity(&self, identity: Identity) -> LedgerResult<()> {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        if state.identities.contains_key(&identity.address) {
            return Err(LedgerError::Reverted(format!(
                "{} is already registered",
                identity.address
            )));
        }

        debug!(address = %identity.address, role = ?identity.role, "identity registered");
        state.identities.insert(identity.address.clone(), identity);
        Ok(())
    }

    async fn identity(&self, address: &Address) -> LedgerResult<Option<Identity>> {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.identities.get(address).cloned())
    }

    async fn resolve_public_key(&self, address: &Address) -> LedgerResult<String> {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        state
            .identities
            .get(address)
            .map(|identity| identity.public_key.clone())
            .ok_or_else(|| LedgerError::UnknownIdentity(address.clone()))
    }

    async fn record_file(&self, file: EncryptedFile) -> LedgerResult<FileId> {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        state.require_identity(&file.owner)?;

        let id = FileId::derive(&file.owner, &file.content_hash, &file.storage_ref);
        if state.files.contains_key(&id) {
            return Err(LedgerError::Reverted(format!("file {} already recorded", id)));
        }

        debug!(file_id = %id, owner = %file.owner, "file recorded");
        state.files.insert(id, file);
        state.file_order.push(id);
        Ok(id)
    }

    async fn get_file(&self, id: &FileId) -> LedgerResult<EncryptedFile> {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        state.file(id).cloned()
    }

    async fn files_by_owner(&self, owner: &Address) -> LedgerResult<Vec<FileEntry>> {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state
            .entries(state.file_order.iter())
            .filter(|entry| &entry.file.owner == owner)
            .collect())
    }

    async fn find_file(
        &self,
        owner: &Address,
        content_hash: &ContentHash,
    ) -> LedgerResult<Option<FileEntry>> {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let found = state
            .entries(state.file_order.iter().rev())
            .find(|entry| &entry.file.owner == owner && &entry.file.content_hash == content_hash);
        Ok(found)
    }

    async fn create_request(
        &self,
        requester: &Address,
        file_id: &FileId,
    ) -> LedgerResult<RequestId> {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        state.require_identity(requester)?;
        let owner = state.file(file_id)?.owner.clone();

        if &owner == requester {
            return Err(LedgerError::Reverted(
                "cannot request access to one's own file".into(),
            ));
        }

        let duplicate = state
            .requests
            .values()
            .any(|r| &r.requester == requester && &r.file_id == file_id && r.state.is_pending());
        if duplicate {
            return Err(LedgerError::Reverted(format!(
                "{} already has a pending request for {}",
                requester, file_id
            )));
        }

        let seq = state.next_request_seq;
        let id = RequestId::derive(requester, file_id, seq);
        state.next_request_seq += 1;

        debug!(request_id = %id, requester = %requester, file_id = %file_id, "request created");
        state
            .requests
            .insert(id, PermissionRequest::pending(id, requester.clone(), *file_id, owner));
        state.request_order.push(id);
        Ok(id)
    }

    async fn list_pending_requests(
        &self,
        owner: &Address,
    ) -> LedgerResult<Vec<PermissionRequest>> {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state
            .ordered_requests()
            .filter(|r| &r.owner == owner && r.state.is_pending())
            .cloned()
            .collect())
    }

    async fn requests_by(&self, requester: &Address) -> LedgerResult<Vec<PermissionRequest>> {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state
            .ordered_requests()
            .filter(|r| &r.requester == requester)
            .cloned()
            .collect())
    }

    async fn approve_request(
        &self,
        approver: &Address,
        request_id: &RequestId,
        wrapped: WrappedKey,
    ) -> LedgerResult<()> {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        let request = state
            .requests
            .get(request_id)
            .ok_or(LedgerError::RequestNotFound(*request_id))?;

        // The recorded file owner is authoritative, not the request's copy.
        let owner = &state.file(&request.file_id)?.owner;
        if owner != approver {
            return Err(LedgerError::Reverted(format!(
                "{} does not own file {}",
                approver, request.file_id
            )));
        }
        if !request.state.is_pending() || state.grants.contains_key(request_id) {
            return Err(LedgerError::Reverted(format!(
                "request {} is not pending",
                request_id
            )));
        }

        if let Some(request) = state.requests.get_mut(request_id) {
            request.approve();
        }
        state.grants.insert(
            *request_id,
            GrantedKey {
                request_id: *request_id,
                wrapped_key_for_requester: wrapped,
            },
        );

        debug!(request_id = %request_id, approver = %approver, "request approved");
        Ok(())
    }

    async fn granted_key(&self, request_id: &RequestId) -> LedgerResult<Option<GrantedKey>> {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        if !state.requests.contains_key(request_id) {
            return Err(LedgerError::RequestNotFound(*request_id));
        }
        Ok(state.grants.get(request_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyward_core::{Role, StorageRef};

    fn identity(name: &str) -> Identity {
        Identity {
            address: Address::from(name),
            public_key: format!("{{\"kty\":\"RSA\",\"n\":\"{}\",\"e\":\"AQAB\"}}", name),
            role: Role::User,
        }
    }

    fn file(owner: &str, body: &str) -> EncryptedFile {
        EncryptedFile {
            owner: Address::from(owner),
            content_hash: ContentHash::from_hex(format!("hash-{}", body)),
            mime_type: "text/plain".into(),
            storage_ref: StorageRef::new(format!("ref-{}", body)),
            wrapped_key_for_owner: WrappedKey::from_base64("d3JhcHBlZA=="),
            file_name: format!("{}.txt", body),
        }
    }

    async fn setup() -> (MemoryLedger, FileId) {
        let ledger = MemoryLedger::new();
        for name in ["alice", "bob", "carol"] {
            ledger.register_identity(identity(name)).await.unwrap();
        }
        let file_id = ledger.record_file(file("alice", "notes")).await.unwrap();
        (ledger, file_id)
    }

    #[tokio::test]
    async fn test_register_and_resolve() {
        let ledger = MemoryLedger::new();
        ledger.register_identity(identity("alice")).await.unwrap();

        let key = ledger.resolve_public_key(&Address::from("alice")).await.unwrap();
        assert!(key.contains("alice"));

        assert!(matches!(
            ledger.resolve_public_key(&Address::from("bob")).await,
            Err(LedgerError::UnknownIdentity(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_registration_reverts() {
        let ledger = MemoryLedger::new();
        ledger.register_identity(identity("alice")).await.unwrap();

        let mut again = identity("alice");
        again.public_key = "other".into();
        assert!(matches!(
            ledger.register_identity(again).await,
            Err(LedgerError::Reverted(_))
        ));

        let key = ledger.resolve_public_key(&Address::from("alice")).await.unwrap();
        assert_ne!(key, "other");
    }

    #[tokio::test]
    async fn test_record_requires_registered_owner() {
        let ledger = MemoryLedger::new();
        assert!(matches!(
            ledger.record_file(file("mallory", "x")).await,
            Err(LedgerError::UnknownIdentity(_))
        ));
        assert_eq!(ledger.file_count(), 0);
    }

    #[tokio::test]
    async fn test_files_by_owner_and_find() {
        let (ledger, first) = setup().await;
        let second = ledger.record_file(file("alice", "report")).await.unwrap();
        ledger.record_file(file("bob", "notes")).await.unwrap();

        let alice = Address::from("alice");
        let ids: Vec<FileId> = ledger
            .files_by_owner(&alice)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![first, second]);

        let found = ledger
            .find_file(&alice, &ContentHash::from_hex("hash-report"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, second);

        assert!(ledger
            .find_file(&alice, &ContentHash::from_hex("hash-missing"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_request_lifecycle() {
        let (ledger, file_id) = setup().await;
        let alice = Address::from("alice");
        let bob = Address::from("bob");

        let request_id = ledger.create_request(&bob, &file_id).await.unwrap();

        let pending = ledger.list_pending_requests(&alice).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, request_id);
        assert_eq!(pending[0].owner, alice);
        assert!(ledger.granted_key(&request_id).await.unwrap().is_none());

        let wrapped = WrappedKey::from_base64("Ym9i");
        ledger
            .approve_request(&alice, &request_id, wrapped.clone())
            .await
            .unwrap();

        assert!(ledger.list_pending_requests(&alice).await.unwrap().is_empty());
        let grant = ledger.granted_key(&request_id).await.unwrap().unwrap();
        assert_eq!(grant.wrapped_key_for_requester, wrapped);

        let mine = ledger.requests_by(&bob).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert!(!mine[0].state.is_pending());
    }

    #[tokio::test]
    async fn test_own_file_request_reverts() {
        let (ledger, file_id) = setup().await;
        assert!(matches!(
            ledger.create_request(&Address::from("alice"), &file_id).await,
            Err(LedgerError::Reverted(_))
        ));
    }

    #[tokio::test]
    async fn test_unregistered_requester_rejected() {
        let (ledger, file_id) = setup().await;
        assert!(matches!(
            ledger.create_request(&Address::from("mallory"), &file_id).await,
            Err(LedgerError::UnknownIdentity(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_pending_request_reverts() {
        let (ledger, file_id) = setup().await;
        let bob = Address::from("bob");
        ledger.create_request(&bob, &file_id).await.unwrap();
        assert!(matches!(
            ledger.create_request(&bob, &file_id).await,
            Err(LedgerError::Reverted(_))
        ));
        assert_eq!(ledger.requests_by(&bob).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_double_approval_reverts() {
        let (ledger, file_id) = setup().await;
        let alice = Address::from("alice");
        let request_id = ledger.create_request(&Address::from("bob"), &file_id).await.unwrap();

        ledger
            .approve_request(&alice, &request_id, WrappedKey::from_base64("Zmlyc3Q="))
            .await
            .unwrap();
        assert!(matches!(
            ledger
                .approve_request(&alice, &request_id, WrappedKey::from_base64("c2Vjb25k"))
                .await,
            Err(LedgerError::Reverted(_))
        ));

        let grant = ledger.granted_key(&request_id).await.unwrap().unwrap();
        assert_eq!(grant.wrapped_key_for_requester.as_str(), "Zmlyc3Q=");
    }

    #[tokio::test]
    async fn test_non_owner_approval_reverts() {
        let (ledger, file_id) = setup().await;
        let request_id = ledger.create_request(&Address::from("bob"), &file_id).await.unwrap();

        for approver in ["bob", "carol"] {
            assert!(matches!(
                ledger
                    .approve_request(&Address::from(approver), &request_id, WrappedKey::from_base64("eA=="))
                    .await,
                Err(LedgerError::Reverted(_))
            ));
        }
        assert_eq!(ledger.list_pending_requests(&Address::from("alice")).await.unwrap().len(), 1);
        assert!(ledger.granted_key(&request_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_request() {
        let (ledger, file_id) = setup().await;
        let bogus = RequestId::derive(&Address::from("bob"), &file_id, 999);
        assert!(matches!(
            ledger
                .approve_request(&Address::from("alice"), &bogus, WrappedKey::from_base64("eA=="))
                .await,
            Err(LedgerError::RequestNotFound(_))
        ));
        assert!(matches!(
            ledger.granted_key(&bogus).await,
            Err(LedgerError::RequestNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_request_ids_stable_across_creation() {
        let (ledger, file_id) = setup().await;
        let alice = Address::from("alice");

        let bobs = ledger.create_request(&Address::from("bob"), &file_id).await.unwrap();
        let before = ledger.list_pending_requests(&alice).await.unwrap();

        let carols = ledger.create_request(&Address::from("carol"), &file_id).await.unwrap();
        let after = ledger.list_pending_requests(&alice).await.unwrap();

        assert_ne!(bobs, carols);
        assert_eq!(before[0].id, bobs);
        assert_eq!(after[0].id, bobs);
        assert_eq!(after[1].id, carols);

        // Approving the first leaves the second's id untouched.
        ledger
            .approve_request(&alice, &bobs, WrappedKey::from_base64("eA=="))
            .await
            .unwrap();
        let remaining = ledger.list_pending_requests(&alice).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, carols);
    }

    #[tokio::test]
    async fn test_new_request_allowed_after_approval() {
        let (ledger, file_id) = setup().await;
        let bob = Address::from("bob");
        let first = ledger.create_request(&bob, &file_id).await.unwrap();
        ledger
            .approve_request(&Address::from("alice"), &first, WrappedKey::from_base64("eA=="))
            .await
            .unwrap();

        let second = ledger.create_request(&bob, &file_id).await.unwrap();
        assert_ne!(first, second);
    }
}
