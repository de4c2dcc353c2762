//! Access token signing seam.
//!
//! Signature creation and verification live outside this subsystem; the
//! ledger only needs something that turns claims into a compact token
//! string. The signer owns the expiry policy; the ledger reads the expiry
//! back out of the signed token via
//! [`derive_access_expiry`](crate::ledger::derive_access_expiry).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AuthResult;

/// Claims carried by a freshly signed access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject: the local user id.
    pub sub: Uuid,

    /// The user's email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// The user's username.
    pub username: String,
}

/// Signs access tokens.
pub trait AccessTokenSigner: Send + Sync {
    /// Signs the claims into a compact token string, adding the standard
    /// registered claims (`exp`, `iat`, ...) per the signer's policy.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    fn sign(&self, claims: &AccessTokenClaims) -> AuthResult<String>;
}
