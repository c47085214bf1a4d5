//! Webhook error types for Stripe webhook handling.
//!
//! Verification failures reject the delivery. Everything raised after
//! verification is a handler failure: it is recorded in the event log and
//! the delivery is still acknowledged.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The `stripe-signature` header was absent.
    #[error("Missing signature")]
    MissingSignature,

    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Webhook timestamp is older than the tolerance window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse the signature header or the signed payload.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required configuration (signing secret, API key) is absent.
    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),

    /// Event object failed to deserialize into the shape its type implies.
    #[error("Malformed {event_type} object: {reason}")]
    MalformedObject { event_type: String, reason: String },

    /// The processor has no subscription with this id.
    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(String),

    /// Call to the payment processor failed.
    #[error("Payment provider error: {0}")]
    Payment(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Returns true if the delivery must be rejected without any processing.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            WebhookError::MissingSignature
                | WebhookError::InvalidSignature
                | WebhookError::TimestampOutOfRange
                | WebhookError::InvalidTimestamp
                | WebhookError::ParseError(_)
        )
    }

    /// Maps the error to the HTTP status returned to the processor.
    ///
    /// Handler failures never reach this point: they are acknowledged
    /// with 200 after being logged.
    pub fn status_code(&self) -> StatusCode {
        if self.is_verification_failure() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    #[test]
    fn missing_signature_displays_correctly() {
        assert_eq!(format!("{}", WebhookError::MissingSignature), "Missing signature");
    }

    #[test]
    fn malformed_object_displays_type_and_reason() {
        let err = WebhookError::MalformedObject {
            event_type: "invoice.payment_failed".to_string(),
            reason: "missing field `id`".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Malformed invoice.payment_failed object: missing field `id`"
        );
    }

    #[test]
    fn verification_failures_return_bad_request() {
        for err in [
            WebhookError::MissingSignature,
            WebhookError::InvalidSignature,
            WebhookError::TimestampOutOfRange,
            WebhookError::InvalidTimestamp,
            WebhookError::ParseError("bad json".to_string()),
        ] {
            assert!(err.is_verification_failure());
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn missing_config_returns_internal_error() {
        let err = WebhookError::MissingConfig("stripe.webhook_secret");
        assert!(!err.is_verification_failure());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn handler_failures_are_not_verification_failures() {
        assert!(!WebhookError::SubscriptionNotFound("sub_1".to_string()).is_verification_failure());
        assert!(!WebhookError::Database("down".to_string()).is_verification_failure());
    }

    #[test]
    fn domain_error_converts_to_database_error() {
        let err: WebhookError = DomainError::new(ErrorCode::DatabaseError, "pool closed").into();
        assert!(matches!(err, WebhookError::Database(msg) if msg.contains("pool closed")));
    }
}
