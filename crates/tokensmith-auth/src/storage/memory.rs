//! In-memory refresh credential storage backed by `DashMap`.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use super::RefreshCredentialStorage;
use crate::AuthResult;
use crate::error::AuthError;
use crate::types::RefreshCredentialRecord;

/// Process-local record store.
///
/// Conditional revocation runs under the shard write lock of the record's
/// entry.
#[derive(Debug, Default)]
pub struct InMemoryRefreshCredentialStorage {
    records: DashMap<Uuid, RefreshCredentialRecord>,
}

impl InMemoryRefreshCredentialStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, revoked ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RefreshCredentialStorage for InMemoryRefreshCredentialStorage {
    async fn insert(&self, record: &RefreshCredentialRecord) -> AuthResult<()> {
        match self.records.entry(record.id) {
            Entry::Occupied(_) => Err(AuthError::storage(format!(
                "refresh credential {} already exists",
                record.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn list_active(&self) -> AuthResult<Vec<RefreshCredentialRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|entry| !entry.revoked)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn revoke_if_active(&self, id: Uuid) -> AuthResult<bool> {
        let Some(mut record) = self.records.get_mut(&id) else {
            return Ok(false);
        };
        if record.revoked {
            return Ok(false);
        }
        record.revoked = true;
        Ok(true)
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<RefreshCredentialRecord>> {
        Ok(self.records.get(&id).map(|entry| entry.value().clone()))
    }
}
