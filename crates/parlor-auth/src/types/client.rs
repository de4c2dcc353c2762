//! OAuth client configuration type.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A resolved OAuth client configuration.
///
/// Clients are rebuilt from configuration on every directory build and are
/// not persisted; two presets declaring the same `id` are merged by set
/// union of their redirect URIs and allowed origins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// OAuth client id registered with the provider.
    pub id: String,

    /// Client secret used for the token-endpoint exchange.
    pub secret: String,

    /// Exact, normalized redirect URIs registered for this client.
    pub redirect_uris: BTreeSet<String>,

    /// Origins allowed for origin-based matching (from wildcard entries,
    /// exact-entry origins, and the explicit origin list).
    pub allowed_origins: BTreeSet<String>,
}

impl ClientConfig {
    /// Creates a client with empty URI and origin sets.
    #[must_use]
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
            redirect_uris: BTreeSet::new(),
            allowed_origins: BTreeSet::new(),
        }
    }

    /// Merges another preset's sets into this client.
    ///
    /// The first preset's secret wins; only the URI and origin sets union.
    pub fn merge_from(&mut self, other: ClientConfig) {
        self.redirect_uris.extend(other.redirect_uris);
        self.allowed_origins.extend(other.allowed_origins);
    }

    /// Returns `true` if this client has at least one exact redirect URI.
    #[must_use]
    pub fn has_redirect_uris(&self) -> bool {
        !self.redirect_uris.is_empty()
    }

    /// Returns the first redirect URI in set order, if any.
    #[must_use]
    pub fn first_redirect_uri(&self) -> Option<&str> {
        self.redirect_uris.iter().next().map(String::as_str)
    }
}
