//! Grant: re-wrap a file's content key for an approved requester.
//!
//! A request moves `Pending -> Approved` exactly once. The owner unwraps
//! their own copy of the content key, wraps it again under the requester's
//! published public key, and commits the result to the ledger. The raw key
//! exists only inside [`GrantWorkflow::approve`].

use tracing::info;

use keyward_core::{Address, GrantedKey, KeyWrapper, PublicKey, RequestId};
use keyward_store::Ledger;

use crate::error::{Result, VaultError};
use crate::keys::KeyPairManager;

pub struct GrantWorkflow<'a> {
    pub keys: &'a KeyPairManager,
    pub ledger: &'a dyn Ledger,
}

impl GrantWorkflow<'_> {
    /// Approve `request_id` as `owner`.
    ///
    /// The ledger is the final arbiter: it rejects a second approval or an
    /// approval by anyone but the file owner even if these checks pass.
    pub async fn approve(&self, owner: &Address, request_id: &RequestId) -> Result<GrantedKey> {
        let request = self
            .ledger
            .list_pending_requests(owner)
            .await?
            .into_iter()
            .find(|r| &r.id == request_id)
            .ok_or(VaultError::RequestNotPending(*request_id))?;

        let file = self.ledger.get_file(&request.file_id).await?;
        if &file.owner != owner || &request.requester == owner {
            return Err(VaultError::NotOwner {
                address: owner.clone(),
                file_id: request.file_id,
            });
        }

        let pair = self.keys.require(owner).await?;

        // The registry's address to key binding is trusted as published.
        let published = self.ledger.resolve_public_key(&request.requester).await?;
        let requester_key = PublicKey::from_jwk_str(&published).map_err(|e| {
            VaultError::InvalidKeyMaterial(format!(
                "published key of {}: {}",
                request.requester, e
            ))
        })?;

        let wrapped = {
            let key = KeyWrapper::unwrap(&file.wrapped_key_for_owner, &pair.private)?;
            KeyWrapper::wrap(&key, &requester_key)?
        };

        self.ledger
            .approve_request(owner, request_id, wrapped.clone())
            .await?;

        info!(
            owner = %owner,
            requester = %request.requester,
            request_id = %request_id,
            file_id = %request.file_id,
            "request approved"
        );

        Ok(GrantedKey {
            request_id: *request_id,
            wrapped_key_for_requester: wrapped,
        })
    }
}
