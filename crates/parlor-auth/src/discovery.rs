//! Provider discovery document fetching and caching.
//!
//! The provider's metadata is fetched from
//! `{issuer}/.well-known/openid-configuration` and cached in a single slot
//! owned by the client directory. The cache has two states, fresh and stale,
//! and is refreshed lazily on the next access after the TTL expires.
//!
//! The slot is guarded by an async `RwLock`; concurrent cache-miss requests
//! may each issue a redundant fetch. The fetch is idempotent, so the last
//! writer wins and the cache converges.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use url::Url;

use crate::AuthResult;
use crate::error::AuthError;

/// Provider metadata from the discovery endpoint.
///
/// Only the fields this subsystem consumes are modeled; unknown fields are
/// ignored on parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderMetadata {
    /// URL the provider asserts as its issuer identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// URL of the provider's token endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,

    /// URL of the provider's userinfo endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,
}

/// Cached discovery document with its fetch timestamp.
struct CachedDiscovery {
    document: ProviderMetadata,
    fetched_at: Instant,
}

/// Single-slot TTL cache over the provider discovery document.
pub struct DiscoveryCache {
    http_client: reqwest::Client,
    ttl: Duration,
    slot: RwLock<Option<CachedDiscovery>>,
}

impl DiscoveryCache {
    /// Creates a cache with the given TTL and HTTP request timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should not happen in
    /// practice).
    #[must_use]
    pub fn new(ttl: Duration, request_timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// Returns the discovery document, fetching it when the cached copy is
    /// missing or stale.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Upstream`] if the fetch fails, returns a
    /// non-success status, or the body cannot be parsed.
    pub async fn get(&self, issuer: &Url) -> AuthResult<ProviderMetadata> {
        {
            let slot = self.slot.read().await;
            if let Some(cached) = slot.as_ref()
                && cached.fetched_at.elapsed() < self.ttl
            {
                tracing::trace!("Discovery cache hit for {}", issuer);
                return Ok(cached.document.clone());
            }
        }

        tracing::debug!("Fetching discovery document from {}", issuer);
        let document = self.fetch(issuer).await?;

        {
            let mut slot = self.slot.write().await;
            *slot = Some(CachedDiscovery {
                document: document.clone(),
                fetched_at: Instant::now(),
            });
        }

        Ok(document)
    }

    /// Drops the cached document, forcing a fetch on next access.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.write().await;
        *slot = None;
    }

    /// Fetches the discovery document from the issuer.
    async fn fetch(&self, issuer: &Url) -> AuthResult<ProviderMetadata> {
        let discovery_url = build_discovery_url(issuer);

        let response = self
            .http_client
            .get(discovery_url.as_str())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Discovery fetch from {} failed: {}", issuer, e);
                AuthError::upstream(format!("discovery fetch failed: {e}"))
            })?;

        if !response.status().is_success() {
            return Err(AuthError::upstream(format!(
                "discovery endpoint returned HTTP {}",
                response.status().as_u16()
            )));
        }

        response.json().await.map_err(|e| {
            tracing::warn!("Failed to parse discovery document from {}: {}", issuer, e);
            AuthError::upstream(format!("unparsable discovery document: {e}"))
        })
    }
}

/// Builds the discovery URL from an issuer URL.
///
/// The document lives at `{issuer}/.well-known/openid-configuration`.
#[must_use]
pub fn build_discovery_url(issuer: &Url) -> Url {
    let mut discovery_url = issuer.clone();
    let path = issuer.path().trim_end_matches('/');
    discovery_url.set_path(&format!("{}/.well-known/openid-configuration", path));
    discovery_url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_discovery_url() {
        let issuer = Url::parse("https://accounts.example.com").unwrap();
        assert_eq!(
            build_discovery_url(&issuer).as_str(),
            "https://accounts.example.com/.well-known/openid-configuration"
        );

        // Trailing slash is collapsed.
        let issuer = Url::parse("https://accounts.example.com/").unwrap();
        assert_eq!(
            build_discovery_url(&issuer).as_str(),
            "https://accounts.example.com/.well-known/openid-configuration"
        );

        // Issuer paths are preserved.
        let issuer = Url::parse("https://accounts.example.com/tenant/a").unwrap();
        assert_eq!(
            build_discovery_url(&issuer).as_str(),
            "https://accounts.example.com/tenant/a/.well-known/openid-configuration"
        );
    }

    #[test]
    fn test_metadata_parse_ignores_unknown_fields() {
        let json = r#"{
            "issuer": "https://accounts.example.com",
            "token_endpoint": "https://accounts.example.com/token",
            "jwks_uri": "https://accounts.example.com/jwks",
            "response_types_supported": ["code"]
        }"#;

        let doc: ProviderMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(
            doc.token_endpoint.as_deref(),
            Some("https://accounts.example.com/token")
        );
        assert!(doc.userinfo_endpoint.is_none());
    }

    #[test]
    fn test_metadata_parse_tolerates_missing_token_endpoint() {
        // A missing token endpoint is rejected at use, not at parse.
        let doc: ProviderMetadata = serde_json::from_str(r#"{"issuer": "x"}"#).unwrap();
        assert!(doc.token_endpoint.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_clears_slot() {
        let cache = DiscoveryCache::new(Duration::from_secs(600), Duration::from_secs(1));
        {
            let mut slot = cache.slot.write().await;
            *slot = Some(CachedDiscovery {
                document: ProviderMetadata {
                    issuer: None,
                    token_endpoint: Some("https://x.example/token".to_string()),
                    userinfo_endpoint: None,
                },
                fetched_at: Instant::now(),
            });
        }

        cache.invalidate().await;
        assert!(cache.slot.read().await.is_none());
    }
}
