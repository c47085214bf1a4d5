//! Payment processor configuration (Stripe)

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Stripe credentials.
///
/// Both secrets are optional. Without the API key the admin endpoints and
/// the webhook answer `MISSING_CONFIG`; without the webhook secret only the
/// webhook does.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Secret API key (`sk_...` or restricted `rk_...`)
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Webhook signing secret (`whsec_...`)
    #[serde(default)]
    pub webhook_secret: Option<SecretString>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl PaymentConfig {
    /// The API key, if set to something non-blank.
    pub fn api_key(&self) -> Option<&SecretString> {
        self.api_key
            .as_ref()
            .filter(|k| !k.expose_secret().trim().is_empty())
    }

    /// The webhook secret, if set to something non-blank.
    pub fn webhook_secret(&self) -> Option<&SecretString> {
        self.webhook_secret
            .as_ref()
            .filter(|k| !k.expose_secret().trim().is_empty())
    }

    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.api_key()
            .map(|k| k.expose_secret().starts_with("sk_test_") || k.expose_secret().starts_with("rk_test_"))
            .unwrap_or(false)
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(key) = self.api_key() {
            let key = key.expose_secret();
            if !key.starts_with("sk_") && !key.starts_with("rk_") {
                return Err(ValidationError::InvalidStripeKey);
            }
        }
        if let Some(secret) = self.webhook_secret() {
            if !secret.expose_secret().starts_with("whsec_") {
                return Err(ValidationError::InvalidStripeWebhookSecret);
            }
        }
        if !self.api_base_url.starts_with("https://") && !self.api_base_url.starts_with("http://") {
            return Err(ValidationError::InvalidStripeBaseUrl);
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            webhook_secret: None,
            api_base_url: default_api_base_url(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.stripe.com".to_string()
}
