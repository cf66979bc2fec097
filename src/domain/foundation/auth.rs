//! Authentication types for the domain layer.
//!
//! An `AuthenticatedUser` is whatever the `SessionValidator` port extracted
//! from a bearer token. Authorization flags such as `is_admin` live on the
//! profile and are always re-read from storage, never taken from the token.

use super::UserId;
use thiserror::Error;

/// Caller identity resolved from a validated bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub email: Option<String>,
}

impl AuthenticatedUser {
    pub fn new(id: UserId, email: Option<String>) -> Self {
        Self { id, email }
    }
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The token is missing, malformed, or has an invalid signature.
    #[error("Invalid token")]
    InvalidToken,

    /// Signature valid but expired. Clients refresh and retry once.
    #[error("Token expired")]
    TokenExpired,

    /// Authenticated, but the profile lacks the admin flag.
    #[error("Insufficient permissions")]
    InsufficientPermissions,

    /// The identity provider could not be reached.
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if the client should refresh its token and retry.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, AuthError::InvalidToken | AuthError::TokenExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_and_invalid_require_reauthentication() {
        assert!(AuthError::TokenExpired.requires_reauthentication());
        assert!(AuthError::InvalidToken.requires_reauthentication());
        assert!(!AuthError::InsufficientPermissions.requires_reauthentication());
        assert!(!AuthError::service_unavailable("down").requires_reauthentication());
    }
}
