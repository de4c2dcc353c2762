//! Domain types for the auth subsystem.

pub mod client;
pub mod profile;
pub mod refresh_token;

pub use client::ClientConfig;
pub use profile::{ExchangedTokens, ProviderProfile, RefreshedTokens, UserProfile};
pub use refresh_token::{IssuedRefreshToken, RefreshTokenRecord, TOKEN_DELIMITER};
