//! Authentication error types.
//!
//! This module defines all error types that can occur during client
//! resolution, code exchange, identity validation, and refresh-token
//! rotation.

use std::fmt;

/// Errors that can occur during authentication operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The auth configuration is missing or unusable (no issuer, no
    /// resolvable client, no redirect URI). Fatal; not user-caused.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// The request is explicitly rejected (e.g. a redirect URI that is
    /// not registered for any client). Caller-caused, non-retryable as-is.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request was rejected.
        message: String,
    },

    /// The request lacks a valid, verifiable identity.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description of why the request is unauthorized.
        message: String,
    },

    /// The refresh token is missing, unknown, or fails hash comparison.
    #[error("Invalid token: {message}")]
    InvalidToken {
        /// Description of why the token is invalid.
        message: String,
    },

    /// The refresh token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// The refresh token has been revoked.
    #[error("Token revoked")]
    TokenRevoked,

    /// The identity provider returned a failure or an unparsable body.
    #[error("Upstream provider error: {message}")]
    Upstream {
        /// Short diagnostic from the provider (error text or status code).
        message: String,
    },

    /// An error occurred while reading or writing auth data.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `Unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidToken` error.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// Creates a new `Upstream` error.
    #[must_use]
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this error was caused by the caller (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest { .. }
                | Self::Unauthorized { .. }
                | Self::InvalidToken { .. }
                | Self::TokenExpired
                | Self::TokenRevoked
        )
    }

    /// Returns `true` if this error originated server-side (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. }
                | Self::Upstream { .. }
                | Self::Storage { .. }
                | Self::Internal { .. }
        )
    }

    /// Returns `true` if this is a refresh-token validation error.
    #[must_use]
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidToken { .. } | Self::TokenExpired | Self::TokenRevoked
        )
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::InvalidRequest { .. } => ErrorCategory::Validation,
            Self::Unauthorized { .. } => ErrorCategory::Authentication,
            Self::InvalidToken { .. } | Self::TokenExpired | Self::TokenRevoked => {
                ErrorCategory::Token
            }
            Self::Upstream { .. } => ErrorCategory::Upstream,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the OAuth 2.0 error code for this error.
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::Unauthorized { .. } => "access_denied",
            Self::InvalidToken { .. } | Self::TokenExpired | Self::TokenRevoked => "invalid_grant",
            Self::Configuration { .. }
            | Self::Upstream { .. }
            | Self::Storage { .. }
            | Self::Internal { .. } => "server_error",
        }
    }
}

/// Categories of authentication errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Identity verification failures.
    Authentication,
    /// Refresh-token validation failures.
    Token,
    /// Request validation failures.
    Validation,
    /// Identity provider failures.
    Upstream,
    /// Storage failures.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Internal server errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Token => write!(f, "token"),
            Self::Validation => write!(f, "validation"),
            Self::Upstream => write!(f, "upstream"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::configuration("issuer is not configured");
        assert_eq!(
            err.to_string(),
            "Configuration error: issuer is not configured"
        );

        let err = AuthError::invalid_token("unknown refresh token");
        assert_eq!(err.to_string(), "Invalid token: unknown refresh token");

        let err = AuthError::TokenExpired;
        assert_eq!(err.to_string(), "Token expired");

        let err = AuthError::upstream("HTTP 502");
        assert_eq!(err.to_string(), "Upstream provider error: HTTP 502");
    }

    #[test]
    fn test_error_predicates() {
        let err = AuthError::invalid_request("redirect URI not allowed");
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
        assert!(!err.is_token_error());

        let err = AuthError::TokenRevoked;
        assert!(err.is_client_error());
        assert!(err.is_token_error());

        let err = AuthError::configuration("no clients");
        assert!(!err.is_client_error());
        assert!(err.is_server_error());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            AuthError::unauthorized("test").category(),
            ErrorCategory::Authentication
        );
        assert_eq!(AuthError::TokenExpired.category(), ErrorCategory::Token);
        assert_eq!(
            AuthError::upstream("test").category(),
            ErrorCategory::Upstream
        );
        assert_eq!(
            AuthError::storage("test").category(),
            ErrorCategory::Infrastructure
        );
    }

    #[test]
    fn test_oauth_error_code() {
        assert_eq!(
            AuthError::invalid_request("test").oauth_error_code(),
            "invalid_request"
        );
        assert_eq!(AuthError::TokenRevoked.oauth_error_code(), "invalid_grant");
        assert_eq!(
            AuthError::configuration("test").oauth_error_code(),
            "server_error"
        );
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Authentication.to_string(), "authentication");
        assert_eq!(ErrorCategory::Token.to_string(), "token");
        assert_eq!(ErrorCategory::Configuration.to_string(), "configuration");
    }
}
