//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` port against the Stripe REST API.
//! Webhooks carry ids that must be expanded and the admin endpoints compare
//! live state against the local mirror. The one write flags a subscription
//! to cancel at period end.
//!
//! Subscription ids are checked against Stripe's id alphabet before they
//! reach a URL; anything else cannot name a subscription and is reported as
//! not found.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key).with_base_url("http://localhost:12111");
//! let adapter = StripePaymentAdapter::new(config);
//! ```

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::billing::{ProcessorSubscription, StripeSubscriptionObject};
use crate::ports::{PaymentError, PaymentErrorCode, PaymentProvider};

pub const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for the Stripe API (override for stripe-mock).
    api_base_url: String,
}

impl StripeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_secret(SecretString::new(api_key.into()))
    }

    pub fn from_secret(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }
}

/// Error body returned by the Stripe API.
#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Stripe implementation of the `PaymentProvider` port.
pub struct StripePaymentAdapter {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripePaymentAdapter {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn subscription_url(&self, subscription_id: &str) -> Result<reqwest::Url, PaymentError> {
        let invalid_base = || {
            PaymentError::new(
                PaymentErrorCode::ProviderError,
                format!("Invalid Stripe base URL: {}", self.config.api_base_url),
            )
        };

        let mut url = reqwest::Url::parse(&self.config.api_base_url).map_err(|_| invalid_base())?;
        url.path_segments_mut()
            .map_err(|_| invalid_base())?
            .pop_if_empty()
            .extend(["v1", "subscriptions", subscription_id]);
        Ok(url)
    }

    /// Turns a subscription response into the port's result shape.
    async fn read_subscription(
        response: reqwest::Response,
        subscription_id: &str,
        action: &str,
    ) -> Result<Option<ProcessorSubscription>, PaymentError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(subscription_id, "Stripe has no such subscription");
            return Ok(None);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = error_from_response(status, &body);
            tracing::warn!(
                subscription_id,
                status = %status,
                error = %error,
                "Stripe subscription {} failed",
                action
            );
            return Err(error);
        }

        let object: StripeSubscriptionObject = response.json().await.map_err(|e| {
            PaymentError::new(
                PaymentErrorCode::InvalidResponse,
                format!("Failed to parse Stripe response: {}", e),
            )
        })?;

        Ok(Some(ProcessorSubscription::from(object)))
    }
}

/// Stripe object ids are an ASCII prefix, an underscore and alphanumerics.
fn is_stripe_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Maps a non-success Stripe response to a `PaymentError`.
fn error_from_response(status: reqwest::StatusCode, body: &str) -> PaymentError {
    let code = match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            PaymentErrorCode::AuthenticationError
        }
        reqwest::StatusCode::TOO_MANY_REQUESTS => PaymentErrorCode::RateLimitExceeded,
        _ => PaymentErrorCode::ProviderError,
    };

    match serde_json::from_str::<StripeErrorEnvelope>(body) {
        Ok(envelope) => {
            let message = envelope
                .error
                .message
                .unwrap_or_else(|| format!("Stripe API error ({})", status));
            let error = PaymentError::new(code, message);
            match envelope.error.code {
                Some(provider_code) => error.with_provider_code(provider_code),
                None => error,
            }
        }
        Err(_) => PaymentError::new(code, format!("Stripe API error ({}): {}", status, body)),
    }
}

#[async_trait]
impl PaymentProvider for StripePaymentAdapter {
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<ProcessorSubscription>, PaymentError> {
        if !is_stripe_id(subscription_id) {
            tracing::warn!(subscription_id, "Refusing malformed subscription id");
            return Ok(None);
        }

        let response = self
            .http_client
            .get(self.subscription_url(subscription_id)?)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        Self::read_subscription(response, subscription_id, "fetch").await
    }

    async fn cancel_at_period_end(
        &self,
        subscription_id: &str,
    ) -> Result<Option<ProcessorSubscription>, PaymentError> {
        if !is_stripe_id(subscription_id) {
            tracing::warn!(subscription_id, "Refusing malformed subscription id");
            return Ok(None);
        }

        let response = self
            .http_client
            .post(self.subscription_url(subscription_id)?)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(&[("cancel_at_period_end", "true")])
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        let updated = Self::read_subscription(response, subscription_id, "cancel").await?;
        if updated.is_some() {
            tracing::info!(subscription_id, "Subscription set to cancel at period end");
        }
        Ok(updated)
    }
}
