//! Billing error types for the admin, cron and plan-read operations.
//!
//! # Wire Code Mapping
//!
//! | Error | Code | HTTP Status |
//! |-------|------|-------------|
//! | Unauthorized | UNAUTHORIZED | 401 |
//! | Forbidden | FORBIDDEN | 403 |
//! | NotOwner | FORBIDDEN | 403 |
//! | InvalidInput | INVALID_INPUT | 400 |
//! | SubscriptionNotFound | SUBSCRIPTION_NOT_FOUND | 404 |
//! | ProfileNotFound | PROFILE_NOT_FOUND | 404 |
//! | NotFound | NOT_FOUND | 404 |
//! | MissingConfig | MISSING_CONFIG | 500 |
//! | QueryFailed | QUERY_FAILED | 500 |
//! | UpdateFailed | UPDATE_FAILED | 500 |
//! | Internal | SERVER_ERROR | 500 |

use crate::domain::foundation::{DomainError, UserId};

/// Errors returned by billing operations outside the webhook path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    /// Caller is not authenticated, or presented a bad secret.
    Unauthorized(String),

    /// Caller is authenticated but not an admin.
    Forbidden,

    /// Caller acted on another user's account.
    NotOwner,

    /// A required request field is missing or blank.
    InvalidInput { field: String, message: String },

    /// A secret or API key the operation needs is not configured.
    MissingConfig(&'static str),

    /// The processor has no subscription with this id.
    SubscriptionNotFound(String),

    /// No profile row for this user.
    ProfileNotFound(UserId),

    /// Generic not-found for self-service reads.
    NotFound(String),

    /// A read from the store failed.
    QueryFailed(String),

    /// A write to the store failed.
    UpdateFailed(String),

    /// Anything else, including processor failures.
    Internal(String),
}

impl BillingError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        BillingError::Unauthorized(message.into())
    }

    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        BillingError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn query_failed(err: impl std::fmt::Display) -> Self {
        BillingError::QueryFailed(err.to_string())
    }

    pub fn update_failed(err: impl std::fmt::Display) -> Self {
        BillingError::UpdateFailed(err.to_string())
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        BillingError::Internal(err.to_string())
    }

    /// The machine-readable code sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            BillingError::Unauthorized(_) => "UNAUTHORIZED",
            BillingError::Forbidden | BillingError::NotOwner => "FORBIDDEN",
            BillingError::InvalidInput { .. } => "INVALID_INPUT",
            BillingError::MissingConfig(_) => "MISSING_CONFIG",
            BillingError::SubscriptionNotFound(_) => "SUBSCRIPTION_NOT_FOUND",
            BillingError::ProfileNotFound(_) => "PROFILE_NOT_FOUND",
            BillingError::NotFound(_) => "NOT_FOUND",
            BillingError::QueryFailed(_) => "QUERY_FAILED",
            BillingError::UpdateFailed(_) => "UPDATE_FAILED",
            BillingError::Internal(_) => "SERVER_ERROR",
        }
    }

    /// Returns a user-facing error message.
    pub fn message(&self) -> String {
        match self {
            BillingError::Unauthorized(msg) => msg.clone(),
            BillingError::Forbidden => "Admin access required.".to_string(),
            BillingError::NotOwner => "You can only manage your own subscription.".to_string(),
            BillingError::InvalidInput { message, .. } => message.clone(),
            BillingError::MissingConfig(what) => format!("{} is not configured.", what),
            BillingError::SubscriptionNotFound(id) => format!("Subscription {} not found.", id),
            BillingError::ProfileNotFound(user_id) => {
                format!("Profile for user {} not found.", user_id)
            }
            BillingError::NotFound(msg) => msg.clone(),
            BillingError::QueryFailed(msg) => format!("Query failed: {}", msg),
            BillingError::UpdateFailed(msg) => format!("Update failed: {}", msg),
            BillingError::Internal(msg) => format!("Server error: {}", msg),
        }
    }
}

impl std::fmt::Display for BillingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message())
    }
}

impl std::error::Error for BillingError {}

impl From<DomainError> for BillingError {
    fn from(err: DomainError) -> Self {
        BillingError::Internal(err.to_string())
    }
}
