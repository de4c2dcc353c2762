//! OAuth client directory.
//!
//! Assembles deduplicated client configurations from the fixed set of named
//! presets, owns the provider discovery cache, and matches an incoming
//! redirect URI or request origin to a configured client.
//!
//! Clients are rebuilt on every [`ClientDirectory::list_clients`] call; they
//! carry no identity across builds beyond the merged client id.

use std::sync::Arc;

use url::Url;

use crate::AuthResult;
use crate::config::{AuthConfig, ClientPreset};
use crate::discovery::{DiscoveryCache, ProviderMetadata};
use crate::error::AuthError;
use crate::redirect::{normalize_url, origin_of, parse_redirect_entry, parse_redirect_list, sanitize};
use crate::types::ClientConfig;

/// Directory of configured OAuth clients plus the provider discovery cache.
pub struct ClientDirectory {
    config: Arc<AuthConfig>,
    discovery: DiscoveryCache,
}

impl ClientDirectory {
    /// Creates a directory over the given configuration.
    #[must_use]
    pub fn new(config: Arc<AuthConfig>) -> Self {
        let discovery = DiscoveryCache::new(config.discovery_ttl, config.request_timeout);
        Self { config, discovery }
    }

    /// Returns the configuration this directory was built over.
    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Builds a single client from a preset.
    ///
    /// Falls back to the shared client secret when the preset declares none.
    /// Returns `None` when no id or no secret can be resolved; the candidate
    /// is excluded from the directory, which is not an error.
    #[must_use]
    pub fn build_client_config(&self, preset: &ClientPreset) -> Option<ClientConfig> {
        let id = preset.client_id.as_deref().and_then(sanitize)?;
        let secret = preset
            .client_secret
            .as_deref()
            .and_then(sanitize)
            .or_else(|| {
                self.config
                    .shared_client_secret
                    .as_deref()
                    .and_then(sanitize)
            })?;

        let mut client = ClientConfig::new(id, secret);

        if let Some(raw) = &preset.redirect_uris {
            for entry in parse_redirect_list(raw) {
                // Malformed entries are dropped; no partial matches are stored.
                let Some(parsed) = parse_redirect_entry(&entry) else {
                    continue;
                };
                if let Some(url) = parsed.exact_url() {
                    client.redirect_uris.insert(url.to_string());
                }
                client.allowed_origins.insert(parsed.origin().to_string());
            }
        }

        if let Some(raw) = &preset.allowed_origins {
            for entry in parse_redirect_list(raw) {
                if let Some(url) = normalize_url(&entry)
                    && let Some(origin) = origin_of(&url)
                {
                    client.allowed_origins.insert(origin);
                }
            }
        }

        Some(client)
    }

    /// Builds all clients from the named presets, deduplicated by id.
    ///
    /// Presets sharing an id are merged by set union of their redirect URIs
    /// and allowed origins; the first preset's secret wins.
    #[must_use]
    pub fn list_clients(&self) -> Vec<ClientConfig> {
        let mut clients: Vec<ClientConfig> = Vec::new();

        for preset in self.config.clients.all() {
            let Some(built) = self.build_client_config(preset) else {
                continue;
            };
            if let Some(existing) = clients.iter_mut().find(|c| c.id == built.id) {
                existing.merge_from(built);
            } else {
                clients.push(built);
            }
        }

        clients
    }

    /// Returns every client id a provider token may legitimately be issued
    /// for: all directory client ids plus the configured native client ids.
    #[must_use]
    pub fn allowed_client_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.list_clients().into_iter().map(|c| c.id).collect();
        for native in &self.config.native_client_ids {
            if let Some(id) = sanitize(native)
                && !ids.contains(&id)
            {
                ids.push(id);
            }
        }
        ids
    }

    /// Returns the provider discovery document, cached for the configured
    /// TTL.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if the issuer is unconfigured,
    /// or [`AuthError::Upstream`] if the fetch fails.
    pub async fn get_discovery(&self) -> AuthResult<ProviderMetadata> {
        let issuer: &Url = self
            .config
            .issuer
            .as_ref()
            .ok_or_else(|| AuthError::configuration("issuer is not configured"))?;

        self.discovery.get(issuer).await
    }
}

/// Finds the client owning a redirect URI.
///
/// The input is normalized, matched exactly against every client's redirect
/// URIs first, and on miss matched by its derived origin against allowed
/// origins. Returns `None` for unparsable input or when no client matches.
#[must_use]
pub fn find_client_for_redirect<'a>(
    clients: &'a [ClientConfig],
    redirect_uri: &str,
) -> Option<&'a ClientConfig> {
    let url = normalize_url(redirect_uri)?;
    let normalized = url.as_str();

    if let Some(client) = clients.iter().find(|c| c.redirect_uris.contains(normalized)) {
        return Some(client);
    }

    let origin = origin_of(&url)?;
    clients.iter().find(|c| c.allowed_origins.contains(&origin))
}

/// Returns a best-effort default client: the first with at least one
/// redirect URI, else the first client in the list.
#[must_use]
pub fn find_default_client(clients: &[ClientConfig]) -> Option<&ClientConfig> {
    clients
        .iter()
        .find(|c| c.has_redirect_uris())
        .or_else(|| clients.first())
}

/// A client matched by request origin, with the redirect URI to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginMatch<'a> {
    /// The matched client.
    pub client: &'a ClientConfig,

    /// The redirect URI resolved for this origin: a client redirect URI on
    /// the same origin when one exists, else the client's first redirect
    /// URI, else `None`.
    pub redirect_uri: Option<String>,
}

/// Finds a client whose allowed origins contain the request origin.
///
/// Among matches, a client owning a redirect URI on that same origin is
/// preferred, since it yields a precise redirect URI for the exchange.
#[must_use]
pub fn find_client_by_origin<'a>(
    clients: &'a [ClientConfig],
    origin: &str,
) -> Option<OriginMatch<'a>> {
    let url = normalize_url(origin)?;
    let origin = origin_of(&url)?;

    let matches: Vec<&ClientConfig> = clients
        .iter()
        .filter(|c| c.allowed_origins.contains(&origin))
        .collect();

    for client in matches.iter().copied() {
        if let Some(uri) = client.redirect_uris.iter().find(|uri| {
            normalize_url(uri)
                .and_then(|u| origin_of(&u))
                .is_some_and(|o| o == origin)
        }) {
            return Some(OriginMatch {
                client,
                redirect_uri: Some(uri.clone()),
            });
        }
    }

    matches.first().copied().map(|client| OriginMatch {
        client,
        redirect_uri: client.first_redirect_uri().map(str::to_string),
    })
}
