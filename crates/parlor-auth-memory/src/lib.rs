//! In-memory storage backend for the parlor-auth subsystem.
//!
//! Implements the `parlor-auth` storage traits over `tokio`-guarded hash
//! maps. Intended for tests and local development; nothing here survives a
//! process restart.

mod refresh_token;
mod user;

pub use refresh_token::MemoryRefreshTokenStorage;
pub use user::{MemoryUserProvisioner, MemoryUserStorage};
