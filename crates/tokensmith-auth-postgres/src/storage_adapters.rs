//! Arc-owning storage adapter for use with the rotation engine.
//!
//! Wraps the lifetime-based [`CredentialStorage`] and owns an `Arc<PgPool>`,
//! allowing it to be used as `Arc<dyn RefreshCredentialStorage>`.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use tokensmith_auth::storage::RefreshCredentialStorage;
use tokensmith_auth::types::RefreshCredentialRecord;
use tokensmith_auth::{AuthError, AuthResult};

use crate::PgPool;
use crate::credential::CredentialStorage;

/// PostgreSQL refresh credential store usable as `Arc<dyn RefreshCredentialStorage>`.
#[derive(Clone)]
pub struct PostgresRefreshCredentialStorage {
    pool: Arc<PgPool>,
}

impl PostgresRefreshCredentialStorage {
    /// Create a store over a shared pool.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshCredentialStorage for PostgresRefreshCredentialStorage {
    async fn insert(&self, record: &RefreshCredentialRecord) -> AuthResult<()> {
        let storage = CredentialStorage::new(&self.pool);
        storage
            .insert(record)
            .await
            .map_err(|e| AuthError::storage(e.to_string()))
    }

    async fn list_active(&self) -> AuthResult<Vec<RefreshCredentialRecord>> {
        let storage = CredentialStorage::new(&self.pool);
        let rows = storage
            .list_active()
            .await
            .map_err(|e| AuthError::storage(e.to_string()))?;
        Ok(rows.into_iter().map(RefreshCredentialRecord::from).collect())
    }

    async fn revoke_if_active(&self, id: Uuid) -> AuthResult<bool> {
        let storage = CredentialStorage::new(&self.pool);
        storage
            .revoke_if_active(id)
            .await
            .map_err(|e| AuthError::storage(e.to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<RefreshCredentialRecord>> {
        let storage = CredentialStorage::new(&self.pool);
        let row = storage
            .find_by_id(id)
            .await
            .map_err(|e| AuthError::storage(e.to_string()))?;
        Ok(row.map(RefreshCredentialRecord::from))
    }
}
