//! Authentication configuration.
//!
//! This module provides the typed configuration for the auth subsystem:
//! OAuth client presets, the identity provider endpoints, and refresh-token
//! settings. The configuration is assembled once at startup and passed by
//! reference to each component; no component reads configuration keys
//! dynamically.
//!
//! # Example (TOML)
//!
//! ```toml
//! [auth]
//! issuer = "https://accounts.example.com"
//! native_client_ids = ["com.parlor.ios"]
//!
//! [auth.clients.web]
//! client_id = "parlor-web"
//! redirect_uris = "https://app.parlor.example/cb, https://staging.parlor.example/*"
//!
//! [auth.refresh]
//! ttl = "7d"
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Root configuration for the auth subsystem.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// The identity provider issuer URL. Discovery is fetched from
    /// `{issuer}/.well-known/openid-configuration`. Required for code
    /// exchange; a missing issuer is a fatal configuration error at use.
    pub issuer: Option<Url>,

    /// OAuth client presets. Presets sharing a client id are merged.
    pub clients: ClientPresets,

    /// Fallback client secret used by presets that do not declare their own.
    pub shared_client_secret: Option<String>,

    /// Statically configured native (mobile) client ids. These participate
    /// in the audience allow-list but have no redirect URIs.
    pub native_client_ids: Vec<String>,

    /// Identity endpoints used for provider profile validation.
    pub provider: ProviderEndpoints,

    /// How long a fetched discovery document stays fresh.
    #[serde(with = "humantime_serde")]
    pub discovery_ttl: Duration,

    /// HTTP request timeout for provider calls.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Refresh-token settings.
    pub refresh: RefreshTokenConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: None,
            clients: ClientPresets::default(),
            shared_client_secret: None,
            native_client_ids: Vec::new(),
            provider: ProviderEndpoints::default(),
            discovery_ttl: Duration::from_secs(600), // 10 minutes
            request_timeout: Duration::from_secs(10),
            refresh: RefreshTokenConfig::default(),
        }
    }
}

/// The fixed set of named client presets.
///
/// Each deployment target gets its own preset; a preset that cannot resolve
/// both an id and a secret is silently excluded from the directory.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientPresets {
    /// The primary web client.
    pub web: ClientPreset,

    /// The companion-app client.
    pub companion: ClientPreset,

    /// The legacy default client.
    pub fallback: ClientPreset,
}

impl ClientPresets {
    /// Returns the presets in build order.
    #[must_use]
    pub fn all(&self) -> [&ClientPreset; 3] {
        [&self.web, &self.companion, &self.fallback]
    }
}

/// A single OAuth client preset.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientPreset {
    /// OAuth client id registered with the provider.
    pub client_id: Option<String>,

    /// Client secret. Falls back to [`AuthConfig::shared_client_secret`]
    /// when absent.
    pub client_secret: Option<String>,

    /// Comma- or newline-delimited redirect URI entries. Entries ending in
    /// `/*` register the origin only.
    pub redirect_uris: Option<String>,

    /// Comma- or newline-delimited additional allowed origins.
    pub allowed_origins: Option<String>,
}

/// Identity endpoints used to validate provider profiles.
///
/// An attempt whose endpoint is unconfigured is skipped, not failed.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderEndpoints {
    /// Endpoint queried with a bearer access token.
    pub userinfo_endpoint: Option<Url>,

    /// Endpoint queried with an id token as a query parameter.
    pub tokeninfo_endpoint: Option<Url>,
}

/// Refresh-token issuance settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RefreshTokenConfig {
    /// Lifetime of an issued refresh token.
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,

    /// Salt mixed into the one-way token hash. Changing it invalidates all
    /// outstanding refresh tokens.
    pub salt: String,
}

impl Default for RefreshTokenConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(7 * 24 * 3600), // 7 days
            salt: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert!(config.issuer.is_none());
        assert_eq!(config.discovery_ttl, Duration::from_secs(600));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.refresh.ttl, Duration::from_secs(7 * 24 * 3600));
        assert!(config.native_client_ids.is_empty());
    }

    #[test]
    fn test_deserialize_partial() {
        let value = serde_json::json!({
            "issuer": "https://accounts.example.com",
            "native_client_ids": ["com.parlor.ios", "com.parlor.android"],
            "clients": {
                "web": {
                    "client_id": "parlor-web",
                    "client_secret": "s3cret",
                    "redirect_uris": "https://app.parlor.example/cb"
                }
            },
            "refresh": { "ttl": "14d" }
        });

        let config: AuthConfig = serde_json::from_value(value).unwrap();
        assert_eq!(
            config.issuer.as_ref().map(Url::as_str),
            Some("https://accounts.example.com/")
        );
        assert_eq!(config.clients.web.client_id.as_deref(), Some("parlor-web"));
        assert!(config.clients.companion.client_id.is_none());
        assert_eq!(config.native_client_ids.len(), 2);
        assert_eq!(config.refresh.ttl, Duration::from_secs(14 * 24 * 3600));
        // Unspecified sections keep their defaults.
        assert_eq!(config.discovery_ttl, Duration::from_secs(600));
    }

    #[test]
    fn test_preset_build_order() {
        let presets = ClientPresets {
            web: ClientPreset {
                client_id: Some("web".into()),
                ..ClientPreset::default()
            },
            companion: ClientPreset {
                client_id: Some("companion".into()),
                ..ClientPreset::default()
            },
            fallback: ClientPreset::default(),
        };

        let ids: Vec<_> = presets
            .all()
            .iter()
            .map(|p| p.client_id.as_deref())
            .collect();
        assert_eq!(ids, vec![Some("web"), Some("companion"), None]);
    }
}
