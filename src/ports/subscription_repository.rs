//! SubscriptionRepository port - the local mirror of processor subscriptions.

use async_trait::async_trait;

use crate::domain::billing::{SubscriptionFilter, SubscriptionRecord, SubscriptionSnapshot};
use crate::domain::foundation::{DomainError, Timestamp, UserId};

/// Port for the subscription mirror table.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Inserts or overwrites the row keyed by `stripe_subscription_id`.
    ///
    /// Last write wins. `user_id` is written only when the row is created
    /// and `past_due_seen_at` is never touched.
    async fn upsert(&self, snapshot: &SubscriptionSnapshot) -> Result<(), DomainError>;

    /// Owner of a mirrored subscription, if the subscription is linked.
    async fn find_user_id(&self, stripe_subscription_id: &str)
        -> Result<Option<UserId>, DomainError>;

    async fn find(&self, stripe_subscription_id: &str)
        -> Result<Option<SubscriptionRecord>, DomainError>;

    /// Stamps `past_due_seen_at` on the row, if it exists.
    async fn mark_past_due_seen(
        &self,
        stripe_subscription_id: &str,
        at: Timestamp,
    ) -> Result<(), DomainError>;

    /// Rows matching `filter`, most recently updated first.
    async fn list(&self, filter: &SubscriptionFilter) -> Result<Vec<SubscriptionSnapshot>, DomainError>;
}
