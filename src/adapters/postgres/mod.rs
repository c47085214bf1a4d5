//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresSubscriptionRepository` - `subscriptions` mirror table
//! - `PostgresProfileRepository` - plan columns of `profiles`
//! - `PostgresWebhookEventRepository` - `webhook_logs` event log

mod profile_repository;
mod subscription_repository;
mod webhook_event_repository;

pub use profile_repository::PostgresProfileRepository;
pub use subscription_repository::PostgresSubscriptionRepository;
pub use webhook_event_repository::PostgresWebhookEventRepository;

use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};

/// Profiles are keyed by the auth provider's UUID.
fn parse_user_id_as_uuid(user_id: &UserId) -> Result<Uuid, DomainError> {
    Uuid::parse_str(user_id.as_str()).map_err(|e| {
        DomainError::new(
            ErrorCode::ValidationFailed,
            format!("User ID must be a valid UUID: {}", e),
        )
    })
}

fn user_id_from_uuid(id: Uuid) -> Result<UserId, DomainError> {
    UserId::new(id.to_string()).map_err(|e| {
        DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
    })
}
