//! Refresh token ledger.
//!
//! Issues, validates, and rotates opaque refresh tokens. Raw tokens have
//! the shape `{token_id}.{secret}`: the id half is an indexed lookup key,
//! the full value is hashed for storage, and knowing a valid id without the
//! secret half gets an attacker nothing.
//!
//! Rotation forms an append-only lineage: each replacement token records the
//! id of the record it superseded, and the first token of a login chain has
//! no parent. Revocation is terminal and is always written before the
//! corresponding failure is returned, so a failed validation cannot later
//! succeed with the identical token.

use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::AuthResult;
use crate::config::RefreshTokenConfig;
use crate::error::AuthError;
use crate::signer::{AccessTokenClaims, AccessTokenSigner};
use crate::storage::{RefreshTokenStorage, UserProvisioner, UserStorage};
use crate::types::refresh_token::TOKEN_DELIMITER;
use crate::types::{IssuedRefreshToken, RefreshTokenRecord, RefreshedTokens};

/// Hard cap on the legacy hash-compare fallback in [`TokenLedger::find_record`].
///
/// Tokens issued by this ledger always carry an indexed id; the scan only
/// serves tokens minted before ids were introduced, and must not grow
/// unbounded with the active-record count.
const MAX_FALLBACK_SCAN: usize = 1_000;

/// Extracts the indexed token id from a raw refresh token.
///
/// Returns the segment before the first delimiter, the whole string when no
/// delimiter is present (legacy tokens), or `None` for empty input.
#[must_use]
pub fn extract_token_id(raw: &str) -> Option<&str> {
    if raw.is_empty() {
        return None;
    }
    match raw.split_once(TOKEN_DELIMITER) {
        Some((token_id, _)) => Some(token_id),
        None => Some(raw),
    }
}

/// Decodes an access token's expiry claim without verifying its signature.
///
/// Returns `None` when the token is not a three-part compact JWT, the
/// payload is not valid JSON, or the `exp` claim is missing or malformed.
#[must_use]
pub fn derive_access_expiry(access_token: &str) -> Option<OffsetDateTime> {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    let mut parts = access_token.split('.');
    let (_header, payload) = (parts.next()?, parts.next()?);

    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?.as_i64()?;

    OffsetDateTime::from_unix_timestamp(exp).ok()
}

/// Issues, validates, and rotates refresh tokens.
pub struct TokenLedger {
    refresh_tokens: Arc<dyn RefreshTokenStorage>,
    users: Arc<dyn UserStorage>,
    provisioner: Arc<dyn UserProvisioner>,
    signer: Arc<dyn AccessTokenSigner>,
    config: RefreshTokenConfig,
}

impl TokenLedger {
    /// Creates a ledger over the given collaborators.
    #[must_use]
    pub fn new(
        refresh_tokens: Arc<dyn RefreshTokenStorage>,
        users: Arc<dyn UserStorage>,
        provisioner: Arc<dyn UserProvisioner>,
        signer: Arc<dyn AccessTokenSigner>,
        config: RefreshTokenConfig,
    ) -> Self {
        Self {
            refresh_tokens,
            users,
            provisioner,
            signer,
            config,
        }
    }

    /// Issues a new refresh token for a user.
    ///
    /// `parent` is the record superseded by this token; pass `None` for the
    /// first token of a login. The raw value is returned exactly once and
    /// only its salted hash is persisted.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the record cannot be persisted.
    pub async fn issue(
        &self,
        user_id: Uuid,
        parent: Option<Uuid>,
    ) -> AuthResult<IssuedRefreshToken> {
        let raw_token = RefreshTokenRecord::generate_raw_token();
        let token_id = extract_token_id(&raw_token)
            .ok_or_else(|| AuthError::internal("generated an empty refresh token"))?
            .to_string();

        let now = OffsetDateTime::now_utc();
        let expires_at = now + self.config.ttl;

        let record = RefreshTokenRecord {
            id: Uuid::new_v4(),
            token_id,
            token_hash: RefreshTokenRecord::hash_token(&self.config.salt, &raw_token),
            user_id,
            created_at: now,
            expires_at,
            revoked: false,
            rotation_parent: parent,
        };

        self.refresh_tokens.create(&record).await?;

        tracing::info!(
            user_id = %user_id,
            record_id = %record.id,
            rotated = parent.is_some(),
            "Issued refresh token"
        );

        Ok(IssuedRefreshToken {
            raw_token,
            expires_at,
            record_id: record.id,
        })
    }

    /// Finds the record a raw token refers to.
    ///
    /// Fast path: indexed lookup by the extracted token id. On miss, falls
    /// back to hash-comparing the raw value against non-revoked records, a
    /// legacy-compatibility path for tokens without an indexed id, bounded
    /// by [`MAX_FALLBACK_SCAN`].
    ///
    /// A hit does not imply validity: the caller still checks revocation,
    /// expiry, and the full-value hash.
    ///
    /// # Errors
    ///
    /// Returns a storage error if a lookup fails.
    pub async fn find_record(&self, raw: &str) -> AuthResult<Option<RefreshTokenRecord>> {
        if let Some(token_id) = extract_token_id(raw)
            && let Some(record) = self.refresh_tokens.find_by_token_id(token_id).await?
        {
            return Ok(Some(record));
        }

        let hash = RefreshTokenRecord::hash_token(&self.config.salt, raw);
        let active = self.refresh_tokens.list_active().await?;
        let scanned = active.len().min(MAX_FALLBACK_SCAN);

        tracing::warn!(
            scanned,
            capped = active.len() > MAX_FALLBACK_SCAN,
            "Refresh token lookup fell back to a full scan"
        );

        Ok(active
            .into_iter()
            .take(MAX_FALLBACK_SCAN)
            .find(|record| record.token_hash == hash))
    }

    /// Validates a raw refresh token and rotates it.
    ///
    /// On success the presented record is revoked and a replacement token
    /// with `rotation_parent` pointing at it is issued, alongside a freshly
    /// signed access token. Every rejection is terminal, and revocation
    /// writes land before the corresponding error is returned.
    ///
    /// Two concurrent calls with the same raw token can both pass
    /// validation before either revokes, each minting a child of the same
    /// parent. There is no claim step closing that window; callers that
    /// need stronger guarantees must serialize per token.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidToken`]: empty input, unknown token, or hash
    ///   mismatch.
    /// - [`AuthError::TokenRevoked`]: the record was already revoked.
    /// - [`AuthError::TokenExpired`]: the record expired (and is now
    ///   revoked).
    /// - [`AuthError::Unauthorized`]: the owning user no longer exists
    ///   (the record is revoked as a side effect).
    pub async fn refresh(&self, raw_token: &str) -> AuthResult<RefreshedTokens> {
        let raw_token = raw_token.trim();
        if raw_token.is_empty() {
            return Err(AuthError::invalid_token("missing refresh token"));
        }

        let record = self
            .find_record(raw_token)
            .await?
            .ok_or_else(|| AuthError::invalid_token("invalid refresh token"))?;

        if record.revoked {
            return Err(AuthError::TokenRevoked);
        }

        if record.is_expired(OffsetDateTime::now_utc()) {
            self.refresh_tokens.mark_revoked(record.id).await?;
            return Err(AuthError::TokenExpired);
        }

        // A guessed token id without the secret half fails here.
        let presented_hash = RefreshTokenRecord::hash_token(&self.config.salt, raw_token);
        if presented_hash != record.token_hash {
            return Err(AuthError::invalid_token("invalid refresh token"));
        }

        let user = match self.users.find_by_id(record.user_id).await? {
            Some(user) => user,
            None => {
                self.refresh_tokens.mark_revoked(record.id).await?;
                return Err(AuthError::unauthorized("user not found"));
            }
        };

        let username = self.provisioner.ensure_username(&user).await?;

        let claims = AccessTokenClaims {
            sub: user.id,
            email: user.email.clone(),
            username: username.clone(),
        };
        let access_token = self.signer.sign(&claims)?;
        let access_expires_at = derive_access_expiry(&access_token);

        let issued = self.issue(user.id, Some(record.id)).await?;
        self.refresh_tokens.mark_revoked(record.id).await?;

        tracing::info!(
            user_id = %user.id,
            parent_id = %record.id,
            child_id = %issued.record_id,
            "Rotated refresh token"
        );

        let mut profile = user.to_profile();
        profile.username = Some(username);

        Ok(RefreshedTokens {
            access_token,
            access_expires_at,
            refresh_token: issued.raw_token,
            refresh_expires_at: issued.expires_at,
            user: profile,
        })
    }
}
