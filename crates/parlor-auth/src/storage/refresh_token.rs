//! Refresh token storage trait.
//!
//! # Security Considerations
//!
//! - Tokens are stored as salted SHA-256 hashes only.
//! - Revocation must be immediate; once written it is terminal.
//! - Records are never deleted; the rotation lineage is retained for
//!   replay audit.

use async_trait::async_trait;
use uuid::Uuid;

use crate::AuthResult;
use crate::types::RefreshTokenRecord;

/// Storage trait for refresh token records.
///
/// Implementations must treat `revoked` as write-once: `mark_revoked` may
/// flip it to `true`, and nothing may ever clear it.
#[async_trait]
pub trait RefreshTokenStorage: Send + Sync {
    /// Persists a new refresh token record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be stored (duplicate token id,
    /// storage unavailable).
    async fn create(&self, record: &RefreshTokenRecord) -> AuthResult<()>;

    /// Finds a record by its indexed token id.
    ///
    /// Returns records regardless of expiry or revocation status; callers
    /// perform their own validity checks.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_token_id(&self, token_id: &str) -> AuthResult<Option<RefreshTokenRecord>>;

    /// Lists all non-revoked records.
    ///
    /// This backs the legacy hash-compare fallback for tokens without an
    /// indexed id; the caller bounds how many records it inspects.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn list_active(&self) -> AuthResult<Vec<RefreshTokenRecord>>;

    /// Sets `revoked = true` on the record with the given id.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is not found or the write fails.
    async fn mark_revoked(&self, id: Uuid) -> AuthResult<()>;
}
