//! User storage and provisioning traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AuthResult;
use crate::types::UserProfile;

/// A local user account, as the auth subsystem sees it.
///
/// The full user model (preferences, payment state, game history) lives
/// elsewhere; only the fields token issuance needs are exposed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for the user.
    pub id: Uuid,

    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Username. May be absent for accounts that have never completed
    /// provisioning; see [`UserProvisioner`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl User {
    /// Builds the caller-facing profile for this user.
    #[must_use]
    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            username: self.username.clone(),
            name: self.name.clone(),
        }
    }
}

/// Read access to user accounts.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Finds a user by id. Returns `None` if no such user exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>>;
}

/// Username provisioning collaborator.
///
/// Invoked during token refresh so that accounts created through federated
/// login acquire a usable username before an access token naming one is
/// signed.
#[async_trait]
pub trait UserProvisioner: Send + Sync {
    /// Ensures the user has a username, creating or normalizing one if
    /// needed, and returns it.
    ///
    /// # Errors
    ///
    /// Returns an error if provisioning fails.
    async fn ensure_username(&self, user: &User) -> AuthResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_profile() {
        let user = User {
            id: Uuid::new_v4(),
            email: Some("player@example.com".to_string()),
            username: Some("player1".to_string()),
            name: None,
        };

        let profile = user.to_profile();
        assert_eq!(profile.id, user.id);
        assert_eq!(profile.email.as_deref(), Some("player@example.com"));
        assert_eq!(profile.username.as_deref(), Some("player1"));
        assert!(profile.name.is_none());
    }
}
