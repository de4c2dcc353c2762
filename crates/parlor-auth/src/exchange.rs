//! Authorization-code exchange and provider profile validation.
//!
//! [`ProviderExchange`] resolves which configured OAuth client a login
//! belongs to, redeems the authorization code at the provider's token
//! endpoint, and validates the resulting identity against the provider's
//! userinfo/tokeninfo endpoints.

use std::sync::Arc;

use serde::Deserialize;
use url::Url;

use crate::AuthResult;
use crate::directory::{
    ClientDirectory, find_client_by_origin, find_client_for_redirect, find_default_client,
};
use crate::error::AuthError;
use crate::redirect::sanitize;
use crate::types::{ClientConfig, ExchangedTokens, ProviderProfile};
use crate::types::profile::parse_verified_flag;

/// Input to [`ProviderExchange::exchange_code`].
#[derive(Debug, Clone, Default)]
pub struct CodeExchangeRequest {
    /// The authorization code returned by the provider.
    pub code: String,

    /// PKCE code verifier, when the flow used one.
    pub code_verifier: Option<String>,

    /// The redirect URI the code was delivered to, when the caller knows it.
    pub redirect_uri: Option<String>,

    /// The origin of the request (e.g. the `Origin` header), used to resolve
    /// the client when no redirect URI was supplied.
    pub request_origin: Option<String>,
}

/// OAuth error body returned by the token endpoint on failure.
#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    error_description: Option<String>,
}

/// Raw identity response from a userinfo/tokeninfo endpoint.
///
/// Field types are deliberately loose; providers disagree on the wire shape
/// of `email_verified` in particular.
#[derive(Debug, Deserialize)]
struct RawIdentityResponse {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<serde_json::Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    aud: Option<String>,
}

/// Redeems authorization codes and validates provider identities.
pub struct ProviderExchange {
    directory: Arc<ClientDirectory>,
    http_client: reqwest::Client,
}

impl ProviderExchange {
    /// Creates an exchange over the given directory.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should not happen in
    /// practice).
    #[must_use]
    pub fn new(directory: Arc<ClientDirectory>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(directory.config().request_timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            directory,
            http_client,
        }
    }

    /// Redeems an authorization code at the provider's token endpoint.
    ///
    /// Client resolution, in order: exact or origin match on the supplied
    /// redirect URI; match on the request origin (which also supplies the
    /// redirect URI sent to the provider); the directory's default client.
    /// A supplied redirect URI that matches no client is rejected outright;
    /// it is never silently replaced.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Configuration`]: no clients configured, no client or
    ///   redirect URI resolvable, or the provider advertises no token
    ///   endpoint.
    /// - [`AuthError::InvalidRequest`]: the supplied redirect URI matches
    ///   no configured client.
    /// - [`AuthError::Upstream`]: the provider rejected the exchange or
    ///   returned an unusable response.
    pub async fn exchange_code(&self, request: &CodeExchangeRequest) -> AuthResult<ExchangedTokens> {
        let clients = self.directory.list_clients();
        if clients.is_empty() {
            return Err(AuthError::configuration("no OAuth clients configured"));
        }

        let (client, redirect_uri) = self.resolve_client(&clients, request)?;

        let discovery = self.directory.get_discovery().await?;
        let token_endpoint = discovery
            .token_endpoint
            .as_deref()
            .ok_or_else(|| AuthError::configuration("provider advertises no token endpoint"))?;

        tracing::debug!(
            client_id = %client.id,
            redirect_uri = %redirect_uri,
            "Exchanging authorization code"
        );

        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", request.code.as_str()),
            ("client_id", client.id.as_str()),
            ("client_secret", client.secret.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
        ];
        if let Some(verifier) = request.code_verifier.as_deref() {
            params.push(("code_verifier", verifier));
        }

        let response = self
            .http_client
            .post(token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Token endpoint request failed: {}", e);
                AuthError::upstream(format!("token endpoint request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<OAuthErrorResponse>().await {
                Ok(body) => match body.error_description {
                    Some(description) => format!("{}: {}", body.error, description),
                    None => body.error,
                },
                Err(_) => format!("token endpoint returned HTTP {}", status.as_u16()),
            };
            tracing::warn!(client_id = %client.id, "Code exchange rejected: {}", message);
            return Err(AuthError::upstream(message));
        }

        let tokens: ExchangedTokens = response.json().await.map_err(|e| {
            AuthError::upstream(format!("unparsable token endpoint response: {e}"))
        })?;

        if tokens.access_token.is_empty() {
            return Err(AuthError::upstream(
                "token endpoint returned no access token",
            ));
        }

        Ok(tokens)
    }

    /// Resolves the client and redirect URI for an exchange request.
    fn resolve_client<'a>(
        &self,
        clients: &'a [ClientConfig],
        request: &CodeExchangeRequest,
    ) -> AuthResult<(&'a ClientConfig, String)> {
        if let Some(supplied) = request.redirect_uri.as_deref().and_then(sanitize) {
            let client = find_client_for_redirect(clients, &supplied).ok_or_else(|| {
                AuthError::invalid_request(format!("redirect URI {supplied} is not allowed"))
            })?;
            return Ok((client, supplied));
        }

        if let Some(origin) = request.request_origin.as_deref().and_then(sanitize)
            && let Some(matched) = find_client_by_origin(clients, &origin)
        {
            let redirect_uri = matched.redirect_uri.ok_or_else(|| {
                AuthError::configuration("matched client has no redirect URI configured")
            })?;
            return Ok((matched.client, redirect_uri));
        }

        let client = find_default_client(clients)
            .ok_or_else(|| AuthError::configuration("unable to resolve an OAuth client"))?;
        let redirect_uri = client
            .first_redirect_uri()
            .ok_or_else(|| AuthError::configuration("default client has no redirect URI"))?
            .to_string();

        Ok((client, redirect_uri))
    }

    /// Validates a provider identity from the exchanged tokens.
    ///
    /// Attempts the configured identity endpoints in order: userinfo with
    /// the access token as a bearer credential, then tokeninfo with the id
    /// token as a query parameter. An unconfigured endpoint, an absent
    /// credential, or a failed attempt is skipped; the next attempt runs.
    ///
    /// A response whose audience is present but not in the allowed client-id
    /// list rejects the whole validation immediately; later attempts must
    /// not launder a token minted for a foreign client.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Unauthorized`]: the audience check failed, or no
    ///   attempt produced a usable identity.
    pub async fn fetch_provider_profile(
        &self,
        access_token: Option<&str>,
        id_token: Option<&str>,
    ) -> AuthResult<ProviderProfile> {
        let allowed_ids = self.directory.allowed_client_ids();
        let endpoints = &self.directory.config().provider;

        if let Some(endpoint) = endpoints.userinfo_endpoint.as_ref()
            && let Some(token) = access_token
        {
            let attempt = self.fetch_userinfo(endpoint, token).await;
            if let Some(profile) = self.evaluate_attempt("userinfo", attempt, &allowed_ids)? {
                return Ok(profile);
            }
        }

        if let Some(endpoint) = endpoints.tokeninfo_endpoint.as_ref()
            && let Some(token) = id_token
        {
            let attempt = self.fetch_tokeninfo(endpoint, token).await;
            if let Some(profile) = self.evaluate_attempt("tokeninfo", attempt, &allowed_ids)? {
                return Ok(profile);
            }
        }

        Err(AuthError::unauthorized(
            "unable to validate provider identity",
        ))
    }

    /// Evaluates one identity attempt.
    ///
    /// `Ok(Some(..))` accepts the identity, `Ok(None)` skips to the next
    /// attempt, `Err(..)` rejects the whole validation.
    fn evaluate_attempt(
        &self,
        source: &str,
        attempt: AuthResult<RawIdentityResponse>,
        allowed_ids: &[String],
    ) -> AuthResult<Option<ProviderProfile>> {
        let raw = match attempt {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!("Identity attempt via {} failed: {}", source, e);
                return Ok(None);
            }
        };

        // Audience mismatch is terminal, not skippable.
        if let Some(aud) = raw.aud.as_deref()
            && !aud.is_empty()
            && !allowed_ids.iter().any(|id| id == aud)
        {
            tracing::warn!(audience = %aud, "Provider token audience is not an allowed client");
            return Err(AuthError::unauthorized(
                "provider token was issued for an unknown client",
            ));
        }

        let Some(subject) = raw.sub.filter(|s| !s.is_empty()) else {
            tracing::debug!("Identity attempt via {} returned no subject", source);
            return Ok(None);
        };
        let Some(email) = raw.email.filter(|e| !e.is_empty()) else {
            tracing::debug!("Identity attempt via {} returned no email", source);
            return Ok(None);
        };

        Ok(Some(ProviderProfile {
            subject,
            email: email.to_lowercase(),
            email_verified: parse_verified_flag(raw.email_verified.as_ref()),
            name: raw.name,
            audience: raw.aud,
        }))
    }

    /// Queries the userinfo endpoint with a bearer access token.
    async fn fetch_userinfo(
        &self,
        endpoint: &Url,
        access_token: &str,
    ) -> AuthResult<RawIdentityResponse> {
        let response = self
            .http_client
            .get(endpoint.as_str())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::upstream(format!("userinfo request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthError::upstream(format!(
                "userinfo endpoint returned HTTP {}",
                response.status().as_u16()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::upstream(format!("unparsable userinfo response: {e}")))
    }

    /// Queries the tokeninfo endpoint with an id token.
    async fn fetch_tokeninfo(
        &self,
        endpoint: &Url,
        id_token: &str,
    ) -> AuthResult<RawIdentityResponse> {
        let response = self
            .http_client
            .get(endpoint.as_str())
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| AuthError::upstream(format!("tokeninfo request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthError::upstream(format!(
                "tokeninfo endpoint returned HTTP {}",
                response.status().as_u16()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::upstream(format!("unparsable tokeninfo response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, ClientPreset, ClientPresets};

    fn exchange_with(presets: ClientPresets) -> ProviderExchange {
        let config = AuthConfig {
            clients: presets,
            shared_client_secret: Some("shared".to_string()),
            ..AuthConfig::default()
        };
        ProviderExchange::new(Arc::new(ClientDirectory::new(Arc::new(config))))
    }

    fn web_preset(redirects: &str) -> ClientPresets {
        ClientPresets {
            web: ClientPreset {
                client_id: Some("parlor-web".to_string()),
                client_secret: Some("s3cret".to_string()),
                redirect_uris: Some(redirects.to_string()),
                allowed_origins: None,
            },
            ..ClientPresets::default()
        }
    }

    #[test]
    fn test_resolve_client_rejects_unknown_redirect() {
        let exchange = exchange_with(web_preset("https://app.example/cb"));
        let clients = exchange.directory.list_clients();

        let request = CodeExchangeRequest {
            code: "abc".to_string(),
            redirect_uri: Some("https://evil.example/cb".to_string()),
            ..CodeExchangeRequest::default()
        };

        let err = exchange.resolve_client(&clients, &request).unwrap_err();
        assert!(matches!(err, AuthError::InvalidRequest { .. }));
    }

    #[test]
    fn test_resolve_client_by_explicit_redirect() {
        let exchange = exchange_with(web_preset("https://app.example/cb"));
        let clients = exchange.directory.list_clients();

        let request = CodeExchangeRequest {
            code: "abc".to_string(),
            redirect_uri: Some("https://app.example/cb".to_string()),
            ..CodeExchangeRequest::default()
        };

        let (client, redirect) = exchange.resolve_client(&clients, &request).unwrap();
        assert_eq!(client.id, "parlor-web");
        assert_eq!(redirect, "https://app.example/cb");
    }

    #[test]
    fn test_resolve_client_by_origin() {
        let exchange = exchange_with(web_preset("https://app.example/cb"));
        let clients = exchange.directory.list_clients();

        let request = CodeExchangeRequest {
            code: "abc".to_string(),
            request_origin: Some("https://app.example".to_string()),
            ..CodeExchangeRequest::default()
        };

        let (client, redirect) = exchange.resolve_client(&clients, &request).unwrap();
        assert_eq!(client.id, "parlor-web");
        assert_eq!(redirect, "https://app.example/cb");
    }

    #[test]
    fn test_resolve_client_falls_back_to_default() {
        let exchange = exchange_with(web_preset("https://app.example/cb"));
        let clients = exchange.directory.list_clients();

        let request = CodeExchangeRequest {
            code: "abc".to_string(),
            ..CodeExchangeRequest::default()
        };

        let (client, redirect) = exchange.resolve_client(&clients, &request).unwrap();
        assert_eq!(client.id, "parlor-web");
        assert_eq!(redirect, "https://app.example/cb");
    }

    #[test]
    fn test_evaluate_attempt_audience_mismatch_is_terminal() {
        let exchange = exchange_with(web_preset("https://app.example/cb"));
        let allowed = vec!["parlor-web".to_string()];

        let raw = RawIdentityResponse {
            sub: Some("sub-1".to_string()),
            email: Some("a@example.com".to_string()),
            email_verified: Some(serde_json::json!(true)),
            name: None,
            aud: Some("someone-else".to_string()),
        };

        let err = exchange
            .evaluate_attempt("userinfo", Ok(raw), &allowed)
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized { .. }));
    }

    #[test]
    fn test_evaluate_attempt_skips_incomplete_identity() {
        let exchange = exchange_with(web_preset("https://app.example/cb"));
        let allowed = vec!["parlor-web".to_string()];

        // Missing email: skip, not reject.
        let raw = RawIdentityResponse {
            sub: Some("sub-1".to_string()),
            email: None,
            email_verified: None,
            name: None,
            aud: None,
        };
        assert!(
            exchange
                .evaluate_attempt("userinfo", Ok(raw), &allowed)
                .unwrap()
                .is_none()
        );

        // Failed fetch: skip.
        assert!(
            exchange
                .evaluate_attempt("userinfo", Err(AuthError::upstream("boom")), &allowed)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_evaluate_attempt_lowercases_email() {
        let exchange = exchange_with(web_preset("https://app.example/cb"));
        let allowed = vec!["parlor-web".to_string()];

        let raw = RawIdentityResponse {
            sub: Some("sub-1".to_string()),
            email: Some("Player@Example.COM".to_string()),
            email_verified: Some(serde_json::json!("1")),
            name: Some("Player One".to_string()),
            aud: Some("parlor-web".to_string()),
        };

        let profile = exchange
            .evaluate_attempt("userinfo", Ok(raw), &allowed)
            .unwrap()
            .unwrap();
        assert_eq!(profile.email, "player@example.com");
        assert!(profile.email_verified);
        assert_eq!(profile.audience.as_deref(), Some("parlor-web"));
    }
}
