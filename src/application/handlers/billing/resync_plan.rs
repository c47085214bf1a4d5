//! ResyncPlanHandler - repairs a user's plan from live processor state.
//!
//! Reruns the reconciler with plan sync on, so the mirror row is refreshed
//! along with the profile.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::billing::{BillingError, Plan};
use crate::domain::foundation::AuthenticatedUser;
use crate::ports::{PaymentProvider, ProfileRepository};

use super::admin_access::{require_admin, AdminTarget};
use super::EntitlementReconciler;

#[derive(Debug, Clone)]
pub struct ResyncPlanCommand {
    pub caller: AuthenticatedUser,
    pub subscription_id: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResyncPlanResult {
    pub status: Option<String>,
    pub plan: Plan,
}

pub struct ResyncPlanHandler {
    profiles: Arc<dyn ProfileRepository>,
    payment_provider: Option<Arc<dyn PaymentProvider>>,
    reconciler: Arc<EntitlementReconciler>,
}

impl ResyncPlanHandler {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        payment_provider: Option<Arc<dyn PaymentProvider>>,
        reconciler: Arc<EntitlementReconciler>,
    ) -> Self {
        Self {
            profiles,
            payment_provider,
            reconciler,
        }
    }

    pub async fn handle(&self, cmd: ResyncPlanCommand) -> Result<ResyncPlanResult, BillingError> {
        require_admin(self.profiles.as_ref(), &cmd.caller).await?;
        let target = AdminTarget::parse(cmd.subscription_id.as_deref(), cmd.user_id.as_deref())?;
        let provider = self
            .payment_provider
            .as_ref()
            .ok_or(BillingError::MissingConfig("STRIPE_SECRET_KEY"))?;

        let subscription = provider
            .get_subscription(&target.subscription_id)
            .await
            .map_err(BillingError::internal)?
            .ok_or_else(|| BillingError::SubscriptionNotFound(target.subscription_id.clone()))?;

        let plan = self
            .reconciler
            .reconcile(&subscription, &target.user_id, true)
            .await
            .map_err(BillingError::update_failed)?
            .unwrap_or_else(|| subscription.expected_plan());

        tracing::info!(
            admin = %cmd.caller.id,
            user_id = %target.user_id,
            subscription_id = %target.subscription_id,
            plan = %plan,
            "Plan resynced"
        );

        Ok(ResyncPlanResult {
            status: subscription.status_str().map(str::to_string),
            plan,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryBillingStore;
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::domain::billing::{GracePolicy, ProcessorSubscription, ProfilePlan, SubscriptionStatus};
    use crate::domain::foundation::UserId;

    fn uid(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn subscription(status: &str) -> ProcessorSubscription {
        ProcessorSubscription {
            id: "sub_123".to_string(),
            customer_id: Some("cus_9".to_string()),
            status: Some(SubscriptionStatus::new(status)),
            price_id: None,
            current_period_end: None,
            cancel_at_period_end: false,
        }
    }

    fn setup(provider: Option<MockPaymentProvider>) -> (InMemoryBillingStore, ResyncPlanHandler) {
        let store = InMemoryBillingStore::new();
        let mut admin = ProfilePlan::new(uid("admin"));
        admin.is_admin = true;
        store.insert_profile(admin);
        store.insert_profile(ProfilePlan::new(uid("user_1")));

        let reconciler = Arc::new(EntitlementReconciler::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            GracePolicy::default(),
        ));
        let handler = ResyncPlanHandler::new(
            Arc::new(store.clone()),
            provider.map(|p| Arc::new(p) as Arc<dyn PaymentProvider>),
            reconciler,
        );
        (store, handler)
    }

    fn command(caller: &str) -> ResyncPlanCommand {
        ResyncPlanCommand {
            caller: AuthenticatedUser::new(uid(caller), None),
            subscription_id: Some("sub_123".to_string()),
            user_id: Some("user_1".to_string()),
        }
    }

    #[tokio::test]
    async fn resync_writes_profile_and_mirror() {
        let (store, handler) = setup(Some(MockPaymentProvider::with_subscription(subscription(
            "trialing",
        ))));

        let result = handler.handle(command("admin")).await.unwrap();

        assert_eq!(
            result,
            ResyncPlanResult {
                status: Some("trialing".to_string()),
                plan: Plan::Pro,
            }
        );
        let profile = store.profile(&uid("user_1")).unwrap();
        assert_eq!(profile.plan, Plan::Pro);
        assert_eq!(profile.stripe_customer_id.as_deref(), Some("cus_9"));
        assert_eq!(store.subscription("sub_123").unwrap().snapshot.user_id, uid("user_1"));
    }

    #[tokio::test]
    async fn non_admin_is_forbidden_before_processor_call() {
        let provider = MockPaymentProvider::with_subscription(subscription("active"));
        let (store, handler) = setup(Some(provider.clone()));

        let err = handler.handle(command("user_1")).await.unwrap_err();

        assert_eq!(err, BillingError::Forbidden);
        assert_eq!(provider.total_calls(), 0);
        assert_eq!(store.mutations().total(), 0);
    }

    #[tokio::test]
    async fn store_failure_is_update_failed() {
        let (store, handler) = setup(Some(MockPaymentProvider::with_subscription(subscription(
            "active",
        ))));
        store.fail_profile_writes(true);

        let err = handler.handle(command("admin")).await.unwrap_err();

        assert_eq!(err.code(), "UPDATE_FAILED");
    }

    #[tokio::test]
    async fn missing_processor_key_is_config_error() {
        let (_store, handler) = setup(None);

        let err = handler.handle(command("admin")).await.unwrap_err();

        assert_eq!(err.code(), "MISSING_CONFIG");
    }

    #[tokio::test]
    async fn unknown_subscription_is_not_found() {
        let (_store, handler) = setup(Some(MockPaymentProvider::new()));

        let err = handler.handle(command("admin")).await.unwrap_err();

        assert_eq!(err.code(), "SUBSCRIPTION_NOT_FOUND");
    }
}
