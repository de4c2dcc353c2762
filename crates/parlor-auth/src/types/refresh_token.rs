//! Refresh token domain types.
//!
//! # Security
//!
//! - Raw token values are returned to the caller exactly once, at issuance.
//! - Only a salted SHA-256 hash is persisted, never the raw value.
//! - Records are never deleted; revocation flips a terminal flag, and the
//!   `rotation_parent` chain is retained for replay audit.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Delimiter joining the indexed token id and the secret half of a raw
/// refresh token.
pub const TOKEN_DELIMITER: char = '.';

/// Refresh token record as persisted.
///
/// The raw token has the shape `{token_id}.{secret}`; `token_id` is the
/// indexed lookup key and `token_hash` is a one-way hash of the full raw
/// value. Validating a presented token means extracting the id, looking the
/// record up, and comparing hashes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRecord {
    /// Unique identifier for this record.
    pub id: Uuid,

    /// Indexed lookup key; the segment of the raw token before the delimiter.
    pub token_id: String,

    /// Salted SHA-256 hash of the full raw token value.
    pub token_hash: String,

    /// User this token was issued to.
    pub user_id: Uuid,

    /// When this record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When this token expires.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    /// Terminal revocation flag. Once set it is never cleared.
    pub revoked: bool,

    /// The record superseded by this one through rotation.
    /// `None` marks the root of a rotation chain (a fresh login).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_parent: Option<Uuid>,
}

impl RefreshTokenRecord {
    /// Returns `true` if this record's expiry is in the past.
    #[must_use]
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }

    /// Hashes a raw token value with the configured salt.
    ///
    /// Used both when persisting new tokens and when comparing presented
    /// tokens against stored records.
    #[must_use]
    pub fn hash_token(salt: &str, raw: &str) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(raw.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Generates a raw refresh token: two random base64url components
    /// joined by [`TOKEN_DELIMITER`]. The first component is the token id.
    #[must_use]
    pub fn generate_raw_token() -> String {
        format!(
            "{}{}{}",
            random_component::<16>(),
            TOKEN_DELIMITER,
            random_component::<32>()
        )
    }
}

/// Generates `N` random bytes encoded as base64url without padding.
fn random_component<const N: usize>() -> String {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    let mut bytes = [0u8; N];
    rand::Rng::fill(&mut rand::thread_rng(), &mut bytes[..]);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// A freshly issued refresh token.
///
/// Transient: the raw value exists only in this struct and is handed to the
/// caller exactly once.
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    /// The raw token value (`{token_id}.{secret}`).
    pub raw_token: String,

    /// When the token expires.
    pub expires_at: OffsetDateTime,

    /// Id of the persisted record backing this token.
    pub record_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn test_hash_token() {
        let hash = RefreshTokenRecord::hash_token("salt", "raw-value");

        // SHA-256 produces 64 hex characters.
        assert_eq!(hash.len(), 64);

        // Deterministic for identical inputs.
        assert_eq!(hash, RefreshTokenRecord::hash_token("salt", "raw-value"));

        // Salt participates in the hash.
        assert_ne!(hash, RefreshTokenRecord::hash_token("other", "raw-value"));
        assert_ne!(hash, RefreshTokenRecord::hash_token("salt", "other-value"));
    }

    #[test]
    fn test_generate_raw_token_shape() {
        let raw = RefreshTokenRecord::generate_raw_token();
        let (id, secret) = raw.split_once(TOKEN_DELIMITER).unwrap();

        // 16 bytes -> 22 base64url chars, 32 bytes -> 43.
        assert_eq!(id.len(), 22);
        assert_eq!(secret.len(), 43);
        assert!(
            raw.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == TOKEN_DELIMITER)
        );
    }

    #[test]
    fn test_generate_raw_token_uniqueness() {
        let tokens: Vec<String> = (0..100)
            .map(|_| RefreshTokenRecord::generate_raw_token())
            .collect();

        let mut unique = tokens.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(tokens.len(), unique.len());
    }

    #[test]
    fn test_is_expired() {
        let now = OffsetDateTime::now_utc();
        let record = test_record(now + Duration::hours(1));
        assert!(!record.is_expired(now));

        let record = test_record(now - Duration::minutes(1));
        assert!(record.is_expired(now));
    }

    #[test]
    fn test_serialization_round_trip() {
        let now = OffsetDateTime::now_utc();
        let record = test_record(now + Duration::days(7));

        let json = serde_json::to_string(&record).unwrap();
        let parsed: RefreshTokenRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.id, record.id);
        assert_eq!(parsed.token_id, record.token_id);
        assert_eq!(parsed.token_hash, record.token_hash);
        assert_eq!(parsed.revoked, record.revoked);
        assert_eq!(parsed.rotation_parent, record.rotation_parent);
    }

    fn test_record(expires_at: OffsetDateTime) -> RefreshTokenRecord {
        RefreshTokenRecord {
            id: Uuid::new_v4(),
            token_id: "abc123".to_string(),
            token_hash: RefreshTokenRecord::hash_token("", "abc123.secret"),
            user_id: Uuid::new_v4(),
            created_at: OffsetDateTime::now_utc(),
            expires_at,
            revoked: false,
            rotation_parent: None,
        }
    }
}
