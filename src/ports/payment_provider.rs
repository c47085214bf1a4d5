//! Payment provider port.
//!
//! The processor's view of a subscription. The webhook path uses it to expand
//! ids carried by checkout sessions and invoices; the admin endpoints use it
//! to fetch live state. The only write is the user-initiated cancellation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::billing::{ProcessorSubscription, WebhookError};
use crate::domain::foundation::{DomainError, ErrorCode};

/// Port for payment provider integrations.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Get subscription by provider ID.
    ///
    /// Returns `Ok(None)` if the provider has no such subscription.
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<ProcessorSubscription>, PaymentError>;

    /// Schedules the subscription to end at the close of its current period.
    ///
    /// Returns the updated subscription, or `Ok(None)` if the provider has
    /// no such subscription.
    async fn cancel_at_period_end(
        &self,
        subscription_id: &str,
    ) -> Result<Option<ProcessorSubscription>, PaymentError>;
}

/// Error from a payment provider call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentError {
    pub code: PaymentErrorCode,
    pub message: String,
    /// Provider-specific error code, when the provider returned one.
    pub provider_code: Option<String>,
    pub retryable: bool,
}

impl PaymentError {
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::AuthenticationError, message)
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        DomainError::new(ErrorCode::PaymentProviderError, err.to_string())
    }
}

impl From<PaymentError> for WebhookError {
    fn from(err: PaymentError) -> Self {
        WebhookError::Payment(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    NetworkError,
    AuthenticationError,
    RateLimitExceeded,
    InvalidResponse,
    ProviderError,
}

impl PaymentErrorCode {
    /// Whether a retry of the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentErrorCode::NetworkError | PaymentErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::InvalidResponse => "invalid_response",
            PaymentErrorCode::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}
