//! Storage traits for auth-related data.
//!
//! Backends live in separate crates (e.g. `parlor-auth-memory` for tests
//! and local development).

pub mod refresh_token;
pub mod user;

pub use refresh_token::RefreshTokenStorage;
pub use user::{User, UserProvisioner, UserStorage};
