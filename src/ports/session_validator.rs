//! Session validation port for bearer tokens.
//!
//! Provider-agnostic: the JWT adapter verifies locally issued HS256 tokens,
//! the mock adapter serves tests.
//!
//! Implementations MUST validate the signature, the audience and the expiry.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates access tokens and extracts user identity.
///
/// # Contract
///
/// - `AuthError::InvalidToken` for malformed tokens or bad signatures
/// - `AuthError::TokenExpired` for expired tokens
/// - `AuthError::ServiceUnavailable` for transient errors
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// `token` is the raw JWT without the "Bearer " prefix.
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
