//! Provider identity and caller-facing result shapes.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A validated identity returned by the provider.
///
/// Accepted only when both the subject identifier and the email are present
/// and non-empty; the email is lower-cased for comparison with local
/// accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    /// Subject identifier, unique per provider.
    pub subject: String,

    /// Lower-cased email address.
    pub email: String,

    /// Whether the provider marked the email as verified.
    pub email_verified: bool,

    /// Display name, if the provider supplied one.
    pub name: Option<String>,

    /// Audience claim from the provider response, if present.
    pub audience: Option<String>,
}

/// Result of a successful authorization-code exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangedTokens {
    /// Provider-issued access token.
    pub access_token: String,

    /// Provider-issued refresh token, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// OpenID Connect id token, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Token type reported by the provider (usually `Bearer`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// Granted scopes, space-separated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Access token lifetime in seconds, as reported by the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

/// Caller-facing user profile returned alongside a token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Local user id.
    pub id: Uuid,

    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Username.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Result of a successful refresh-token rotation.
#[derive(Debug, Clone)]
pub struct RefreshedTokens {
    /// Newly signed access token.
    pub access_token: String,

    /// The access token's expiry, when its payload carries one.
    pub access_expires_at: Option<OffsetDateTime>,

    /// Raw replacement refresh token.
    pub refresh_token: String,

    /// The replacement refresh token's expiry.
    pub refresh_expires_at: OffsetDateTime,

    /// The owning user's profile.
    pub user: UserProfile,
}

/// Parses a provider's loosely-typed email-verification flag.
///
/// Providers disagree on the wire type of `email_verified`; the accepted
/// truthy representations are exactly `true`, `"true"`, `1`, and `"1"`.
/// Everything else, including absence, is `false`.
#[must_use]
pub fn parse_verified_flag(value: Option<&serde_json::Value>) -> bool {
    match value {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::String(s)) => s == "true" || s == "1",
        Some(serde_json::Value::Number(n)) => n.as_i64() == Some(1) || n.as_u64() == Some(1),
        _ => false,
    }
}
