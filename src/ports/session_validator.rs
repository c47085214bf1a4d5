//! Session validation port for JWT token validation.
//!
//! Provider-agnostic: the HS256 session-token validator and the test mock
//! both implement it.
//!
//! All implementations must validate:
//! - **Signature**: token was issued by the configured auth provider
//! - **Audience (aud)**: token is intended for this application
//! - **Expiry (exp)**: token is not expired

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
    /// Validate a JWT access token (without the "Bearer " prefix).
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
