//! Refresh credential storage trait.
//!
//! # Security Considerations
//!
//! - Records hold salted digests only, so lookup by secret is a scan
//! - Revocation must be a single atomic conditional update
//! - Records are never deleted by the engine

use async_trait::async_trait;
use uuid::Uuid;

use crate::AuthResult;
use crate::token::SecretHasher;
use crate::types::RefreshCredentialRecord;

/// Storage trait for refresh credential records.
///
/// Implementations must make [`revoke_if_active`](Self::revoke_if_active)
/// atomic: when several callers race on the same id exactly one of them
/// observes `true`.
#[async_trait]
pub trait RefreshCredentialStorage: Send + Sync {
    /// Stores a new record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be stored (e.g. duplicate id,
    /// storage unavailable).
    async fn insert(&self, record: &RefreshCredentialRecord) -> AuthResult<()>;

    /// Returns every non-revoked record, expired ones included.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn list_active(&self) -> AuthResult<Vec<RefreshCredentialRecord>>;

    /// Revokes the record if it is still active.
    ///
    /// Returns `true` only if this call flipped `revoked` from false to true.
    /// Unknown ids and already revoked records return `false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn revoke_if_active(&self, id: Uuid) -> AuthResult<bool>;

    /// Finds a record by its id, regardless of state.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<RefreshCredentialRecord>>;

    /// Finds the active record whose digest matches `secret`.
    ///
    /// Salted digests cannot be indexed, so this scans [`list_active`](Self::list_active)
    /// and verifies each digest.
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails or verification cannot run.
    async fn find_active_match(
        &self,
        secret: &str,
        hasher: &SecretHasher,
    ) -> AuthResult<Option<RefreshCredentialRecord>> {
        let candidates = self.list_active().await?;
        hasher.find_match(candidates, secret).await
    }
}
