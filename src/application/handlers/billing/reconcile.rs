//! EntitlementReconciler - writes a subscription snapshot and its derived plan.
//!
//! Two independent writes, no transaction:
//! 1. Upsert the mirror row keyed by `stripe_subscription_id` (last write wins).
//! 2. When asked, set the profile plan from `plan_for_status`, caching the
//!    processor ids. If that write fails, retry with the plan alone.
//!
//! Running it twice with the same input leaves the same stored state apart
//! from `updated_at`.

use std::sync::Arc;

use crate::domain::billing::{BillingIds, GracePolicy, Plan, PlanUpdate, ProcessorSubscription};
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::ports::{ProfileRepository, SubscriptionRepository};

pub struct EntitlementReconciler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    profiles: Arc<dyn ProfileRepository>,
    grace_policy: GracePolicy,
}

impl EntitlementReconciler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        profiles: Arc<dyn ProfileRepository>,
        grace_policy: GracePolicy,
    ) -> Self {
        Self {
            subscriptions,
            profiles,
            grace_policy,
        }
    }

    /// Mirrors `subscription` for `user_id` and, if `sync_plan`, updates the
    /// profile plan.
    ///
    /// Returns the plan written, or `None` when `sync_plan` is false.
    pub async fn reconcile(
        &self,
        subscription: &ProcessorSubscription,
        user_id: &UserId,
        sync_plan: bool,
    ) -> Result<Option<Plan>, DomainError> {
        let now = Timestamp::now();

        self.subscriptions
            .upsert(&subscription.snapshot_for(user_id, now))
            .await?;

        if !sync_plan {
            return Ok(None);
        }

        let plan = subscription.expected_plan();
        let update = PlanUpdate::new(
            plan,
            BillingIds {
                stripe_customer_id: subscription.customer_id.clone(),
                stripe_subscription_id: subscription.id.clone(),
            },
            &self.grace_policy,
            now,
        );

        let changed = match self.profiles.apply_plan(user_id, &update).await {
            Ok(changed) => changed,
            Err(err) => {
                tracing::warn!(
                    user_id = %user_id,
                    subscription_id = %subscription.id,
                    error = %err,
                    "Profile update failed, retrying with plan only"
                );
                self.profiles.apply_plan(user_id, &update.plan_only()).await?
            }
        };

        if changed == 0 {
            tracing::warn!(
                user_id = %user_id,
                subscription_id = %subscription.id,
                "No profile row to update"
            );
        } else {
            tracing::info!(
                user_id = %user_id,
                subscription_id = %subscription.id,
                status = subscription.status_str().unwrap_or("none"),
                plan = %plan,
                "Plan reconciled"
            );
        }

        Ok(Some(plan))
    }
}
