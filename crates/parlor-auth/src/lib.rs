//! # parlor-auth
//!
//! Authentication token subsystem for Parlor servers: OAuth client
//! resolution, authorization-code exchange against an OpenID Connect
//! provider, and opaque refresh-token issuance with rotation.
//!
//! ## Architecture
//!
//! - [`config`]: typed configuration: client presets, provider endpoints,
//!   refresh-token settings.
//! - [`redirect`]: redirect URI normalization and wildcard-origin parsing.
//! - [`directory`]: assembles deduplicated clients from the presets, owns
//!   the provider discovery cache, and matches redirect URIs and origins to
//!   clients.
//! - [`exchange`]: redeems authorization codes (with PKCE) and validates
//!   the provider identity via userinfo/tokeninfo.
//! - [`ledger`]: issues, validates, and rotates refresh tokens; tokens are
//!   stored as salted hashes and rotation keeps a full lineage.
//! - [`storage`]: backend traits; implementations live in sibling crates
//!   such as `parlor-auth-memory`.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use parlor_auth::config::AuthConfig;
//! use parlor_auth::directory::ClientDirectory;
//! use parlor_auth::exchange::{CodeExchangeRequest, ProviderExchange};
//!
//! # async fn example() -> parlor_auth::AuthResult<()> {
//! let config = Arc::new(AuthConfig::default());
//! let directory = Arc::new(ClientDirectory::new(config));
//! let exchange = ProviderExchange::new(directory);
//!
//! let tokens = exchange
//!     .exchange_code(&CodeExchangeRequest {
//!         code: "authorization-code".to_string(),
//!         code_verifier: Some("pkce-verifier".to_string()),
//!         redirect_uri: Some("https://app.parlor.example/cb".to_string()),
//!         request_origin: None,
//!     })
//!     .await?;
//!
//! let profile = exchange
//!     .fetch_provider_profile(Some(&tokens.access_token), tokens.id_token.as_deref())
//!     .await?;
//! println!("logged in as {}", profile.email);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod directory;
pub mod discovery;
pub mod error;
pub mod exchange;
pub mod ledger;
pub mod redirect;
pub mod signer;
pub mod storage;
pub mod types;

pub use config::AuthConfig;
pub use directory::ClientDirectory;
pub use error::AuthError;
pub use exchange::{CodeExchangeRequest, ProviderExchange};
pub use ledger::TokenLedger;
pub use signer::{AccessTokenClaims, AccessTokenSigner};
pub use types::{
    ClientConfig, ExchangedTokens, IssuedRefreshToken, ProviderProfile, RefreshTokenRecord,
    RefreshedTokens, UserProfile,
};

/// Result type used throughout the auth subsystem.
pub type AuthResult<T> = Result<T, AuthError>;
