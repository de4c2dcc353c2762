//! In-memory refresh token storage.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use parlor_auth::AuthResult;
use parlor_auth::error::AuthError;
use parlor_auth::storage::RefreshTokenStorage;
use parlor_auth::types::RefreshTokenRecord;

/// In-memory refresh token store keyed by record id, with a token-id index.
///
/// Records are never deleted; revocation only flips the flag, matching the
/// lineage-retention contract of the trait.
#[derive(Default)]
pub struct MemoryRefreshTokenStorage {
    records: RwLock<HashMap<Uuid, RefreshTokenRecord>>,
    by_token_id: RwLock<HashMap<String, Uuid>>,
}

impl MemoryRefreshTokenStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records, revoked included.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns `true` if no records are stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RefreshTokenStorage for MemoryRefreshTokenStorage {
    async fn create(&self, record: &RefreshTokenRecord) -> AuthResult<()> {
        let mut index = self.by_token_id.write().await;
        if index.contains_key(&record.token_id) {
            return Err(AuthError::storage(format!(
                "duplicate token id {}",
                record.token_id
            )));
        }
        index.insert(record.token_id.clone(), record.id);

        self.records.write().await.insert(record.id, record.clone());
        Ok(())
    }

    async fn find_by_token_id(&self, token_id: &str) -> AuthResult<Option<RefreshTokenRecord>> {
        let index = self.by_token_id.read().await;
        let Some(id) = index.get(token_id) else {
            return Ok(None);
        };
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn list_active(&self) -> AuthResult<Vec<RefreshTokenRecord>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|record| !record.revoked)
            .cloned()
            .collect())
    }

    async fn mark_revoked(&self, id: Uuid) -> AuthResult<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&id)
            .ok_or_else(|| AuthError::storage(format!("refresh token record {id} not found")))?;
        record.revoked = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn record(token_id: &str) -> RefreshTokenRecord {
        let now = OffsetDateTime::now_utc();
        RefreshTokenRecord {
            id: Uuid::new_v4(),
            token_id: token_id.to_string(),
            token_hash: "hash".to_string(),
            user_id: Uuid::new_v4(),
            created_at: now,
            expires_at: now + std::time::Duration::from_secs(3600),
            revoked: false,
            rotation_parent: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = MemoryRefreshTokenStorage::new();
        let record = record("t1");
        store.create(&record).await.unwrap();

        let found = store.find_by_token_id("t1").await.unwrap().unwrap();
        assert_eq!(found.id, record.id);
        assert!(store.find_by_token_id("t2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_token_id_rejected() {
        let store = MemoryRefreshTokenStorage::new();
        store.create(&record("t1")).await.unwrap();
        assert!(store.create(&record("t1")).await.is_err());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_revoked_records_leave_active_list_but_stay_findable() {
        let store = MemoryRefreshTokenStorage::new();
        let record = record("t1");
        store.create(&record).await.unwrap();
        store.mark_revoked(record.id).await.unwrap();

        assert!(store.list_active().await.unwrap().is_empty());
        // Revocation is not deletion.
        let found = store.find_by_token_id("t1").await.unwrap().unwrap();
        assert!(found.revoked);
    }

    #[tokio::test]
    async fn test_mark_revoked_unknown_id_errors() {
        let store = MemoryRefreshTokenStorage::new();
        assert!(store.mark_revoked(Uuid::new_v4()).await.is_err());
    }
}
