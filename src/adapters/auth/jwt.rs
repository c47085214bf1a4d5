//! HS256 session token adapter.
//!
//! Validates the access tokens issued by the hosted auth service, which signs
//! them with a shared secret. It checks:
//!
//! 1. Signature against the configured secret (HS256 only)
//! 2. Audience (`aud`) against the configured audience
//! 3. Expiry (`exp`)
//!
//! and maps `sub`/`email` onto `AuthenticatedUser`.
//!
//! # Example
//!
//! ```ignore
//! let config = JwtConfig::new(secret, "authenticated");
//! let validator = JwtSessionValidator::new(config);
//! let user = validator.validate("eyJ...").await?;
//! ```

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Configuration for the HS256 validator.
#[derive(Clone)]
pub struct JwtConfig {
    /// Shared signing secret.
    pub secret: SecretString,

    /// Expected `aud` claim.
    pub audience: String,

    /// Clock skew allowance for `exp`, in seconds.
    pub leeway_secs: u64,
}

impl JwtConfig {
    pub fn new(secret: SecretString, audience: impl Into<String>) -> Self {
        Self {
            secret,
            audience: audience.into(),
            leeway_secs: 30,
        }
    }

    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }
}

/// Claims we read from a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject - the user ID
    pub sub: String,

    /// Expiry timestamp (Unix epoch seconds)
    pub exp: i64,

    #[serde(default)]
    pub aud: Option<Audience>,

    #[serde(default)]
    pub email: Option<String>,

    /// Role granted by the auth service ("authenticated", "anon", ...).
    #[serde(default)]
    pub role: Option<String>,
}

/// Audience can be a single string or array of strings in JWTs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

/// `SessionValidator` backed by a shared HS256 secret.
pub struct JwtSessionValidator {
    config: JwtConfig,
    decoding_key: DecodingKey,
}

impl JwtSessionValidator {
    pub fn new(config: JwtConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.expose_secret().as_bytes());
        Self {
            config,
            decoding_key,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.validate_exp = true;
        validation.leeway = self.config.leeway_secs;
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);
        validation
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation())
            .map_err(|e| {
                use jsonwebtoken::errors::ErrorKind;
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        tracing::debug!("Token expired");
                        AuthError::TokenExpired
                    }
                    ErrorKind::InvalidAudience => {
                        tracing::warn!("Invalid audience in token");
                        AuthError::InvalidToken
                    }
                    _ => {
                        tracing::debug!("Token validation failed: {}", e);
                        AuthError::InvalidToken
                    }
                }
            })?;

        let claims = data.claims;
        if claims.role.as_deref() == Some("anon") {
            tracing::debug!("Rejected anonymous token");
            return Err(AuthError::InvalidToken);
        }

        let user_id = UserId::new(&claims.sub).map_err(|_| {
            tracing::warn!("Invalid user ID in token: {:?}", claims.sub);
            AuthError::InvalidToken
        })?;

        Ok(AuthenticatedUser::new(user_id, claims.email))
    }
}

impl std::fmt::Debug for JwtSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionValidator")
            .field("audience", &self.config.audience)
            .finish_non_exhaustive()
    }
}
