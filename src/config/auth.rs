//! Authentication configuration (HS256 session tokens)

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Settings for validating the auth service's session tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 signing secret
    pub jwt_secret: SecretString,

    /// Expected `aud` claim
    #[serde(default = "default_audience")]
    pub jwt_audience: String,

    /// Clock skew allowance for `exp`, in seconds
    #[serde(default = "default_leeway")]
    pub leeway_secs: u64,
}

impl AuthConfig {
    /// Validate authentication configuration
    ///
    /// Production requires a secret of at least 32 bytes.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        let secret = self.jwt_secret.expose_secret();
        if secret.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__JWT_SECRET"));
        }
        if self.jwt_audience.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__JWT_AUDIENCE"));
        }
        if *environment == Environment::Production && secret.len() < 32 {
            return Err(ValidationError::JwtSecretTooShort);
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: SecretString::new(String::new()),
            jwt_audience: default_audience(),
            leeway_secs: default_leeway(),
        }
    }
}

fn default_audience() -> String {
    "authenticated".to_string()
}

fn default_leeway() -> u64 {
    30
}
