//! In-memory user storage and provisioning.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use parlor_auth::AuthResult;
use parlor_auth::storage::{User, UserProvisioner, UserStorage};

/// In-memory user store keyed by user id.
#[derive(Default)]
pub struct MemoryUserStorage {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a user.
    pub async fn put(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    /// Removes a user, returning it if present.
    pub async fn remove(&self, id: Uuid) -> Option<User> {
        self.users.write().await.remove(&id)
    }
}

#[async_trait]
impl UserStorage for MemoryUserStorage {
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }
}

/// Provisioner that derives a username and writes it back to the store.
///
/// An existing username is returned as-is. Otherwise one is derived from the
/// email local part (lower-cased, non-alphanumeric characters mapped to
/// `-`), falling back to `user-{id prefix}` for accounts without an email.
pub struct MemoryUserProvisioner {
    users: Arc<MemoryUserStorage>,
}

impl MemoryUserProvisioner {
    /// Creates a provisioner writing back to the given store.
    #[must_use]
    pub fn new(users: Arc<MemoryUserStorage>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserProvisioner for MemoryUserProvisioner {
    async fn ensure_username(&self, user: &User) -> AuthResult<String> {
        if let Some(username) = user.username.as_deref()
            && !username.is_empty()
        {
            return Ok(username.to_string());
        }

        let username = derive_username(user);

        let mut updated = user.clone();
        updated.username = Some(username.clone());
        self.users.put(updated).await;

        Ok(username)
    }
}

fn derive_username(user: &User) -> String {
    if let Some(email) = user.email.as_deref()
        && let Some((local, _domain)) = email.split_once('@')
        && !local.is_empty()
    {
        return local
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
    }

    let id = user.id.simple().to_string();
    format!("user-{}", &id[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: Option<&str>, username: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.map(str::to_string),
            username: username.map(str::to_string),
            name: None,
        }
    }

    #[tokio::test]
    async fn test_existing_username_is_kept() {
        let store = Arc::new(MemoryUserStorage::new());
        let provisioner = MemoryUserProvisioner::new(store.clone());

        let user = user(Some("p@example.com"), Some("player1"));
        let username = provisioner.ensure_username(&user).await.unwrap();
        assert_eq!(username, "player1");
    }

    #[tokio::test]
    async fn test_username_derived_from_email_and_persisted() {
        let store = Arc::new(MemoryUserStorage::new());
        let provisioner = MemoryUserProvisioner::new(store.clone());

        let user = user(Some("Player.One@Example.com"), None);
        store.put(user.clone()).await;

        let username = provisioner.ensure_username(&user).await.unwrap();
        assert_eq!(username, "player-one");

        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.username.as_deref(), Some("player-one"));
    }

    #[tokio::test]
    async fn test_username_fallback_without_email() {
        let store = Arc::new(MemoryUserStorage::new());
        let provisioner = MemoryUserProvisioner::new(store.clone());

        let user = user(None, None);
        let username = provisioner.ensure_username(&user).await.unwrap();
        assert!(username.starts_with("user-"));
        assert_eq!(username.len(), "user-".len() + 8);
    }
}
