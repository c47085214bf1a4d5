//! CheckPlanHandler - compares a user's stored plan with the processor's view.
//!
//! Read-only drift detection for operators: nothing is written.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::billing::{BillingError, Plan};
use crate::domain::foundation::AuthenticatedUser;
use crate::ports::{PaymentProvider, ProfileRepository};

use super::admin_access::{require_admin, AdminTarget};

/// Command to check one user's plan against one subscription.
#[derive(Debug, Clone)]
pub struct CheckPlanCommand {
    pub caller: AuthenticatedUser,
    pub subscription_id: Option<String>,
    pub user_id: Option<String>,
}

/// Live status, the plan it implies, and the plan stored on the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckPlanResult {
    pub status: Option<String>,
    pub expected_plan: Plan,
    pub current_plan: Plan,
    pub matches: bool,
}

pub struct CheckPlanHandler {
    profiles: Arc<dyn ProfileRepository>,
    payment_provider: Option<Arc<dyn PaymentProvider>>,
}

impl CheckPlanHandler {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        payment_provider: Option<Arc<dyn PaymentProvider>>,
    ) -> Self {
        Self {
            profiles,
            payment_provider,
        }
    }

    pub async fn handle(&self, cmd: CheckPlanCommand) -> Result<CheckPlanResult, BillingError> {
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
        let expected_plan = subscription.expected_plan();

        let profile = self
            .profiles
            .find(&target.user_id)
            .await
            .map_err(|e| {
                tracing::warn!(user_id = %target.user_id, error = %e, "Profile read failed");
                BillingError::ProfileNotFound(target.user_id.clone())
            })?
            .ok_or_else(|| BillingError::ProfileNotFound(target.user_id.clone()))?;

        let matches = profile.plan == expected_plan;
        tracing::info!(
            admin = %cmd.caller.id,
            user_id = %target.user_id,
            subscription_id = %target.subscription_id,
            expected = %expected_plan,
            current = %profile.plan,
            matches,
            "Plan check"
        );

        Ok(CheckPlanResult {
            status: subscription.status_str().map(str::to_string),
            expected_plan,
            current_plan: profile.plan,
            matches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryBillingStore;
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::domain::billing::{ProcessorSubscription, ProfilePlan, SubscriptionStatus};
    use crate::domain::foundation::UserId;
    use crate::ports::PaymentError;

    fn uid(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn subscription(status: &str) -> ProcessorSubscription {
        ProcessorSubscription {
            id: "sub_123".to_string(),
            customer_id: Some("cus_1".to_string()),
            status: Some(SubscriptionStatus::new(status)),
            price_id: None,
            current_period_end: None,
            cancel_at_period_end: false,
        }
    }

    fn store_with_admin() -> InMemoryBillingStore {
        let store = InMemoryBillingStore::new();
        let mut admin = ProfilePlan::new(uid("admin"));
        admin.is_admin = true;
        store.insert_profile(admin);
        store
    }

    fn command(caller: &str) -> CheckPlanCommand {
        CheckPlanCommand {
            caller: AuthenticatedUser::new(uid(caller), None),
            subscription_id: Some("sub_123".to_string()),
            user_id: Some("user_1".to_string()),
        }
    }

    fn handler(store: &InMemoryBillingStore, provider: Option<MockPaymentProvider>) -> CheckPlanHandler {
        CheckPlanHandler::new(
            Arc::new(store.clone()),
            provider.map(|p| Arc::new(p) as Arc<dyn PaymentProvider>),
        )
    }

    #[tokio::test]
    async fn reports_mismatch_between_free_profile_and_active_subscription() {
        let store = store_with_admin();
        store.insert_profile(ProfilePlan::new(uid("user_1")));
        let provider = MockPaymentProvider::with_subscription(subscription("active"));

        let result = handler(&store, Some(provider)).handle(command("admin")).await.unwrap();

        assert_eq!(
            result,
            CheckPlanResult {
                status: Some("active".to_string()),
                expected_plan: Plan::Pro,
                current_plan: Plan::Free,
                matches: false,
            }
        );
        assert_eq!(store.mutations().total(), 0);
    }

    #[tokio::test]
    async fn reports_match() {
        let store = store_with_admin();
        let mut profile = ProfilePlan::new(uid("user_1"));
        profile.plan = Plan::Grace;
        store.insert_profile(profile);
        let provider = MockPaymentProvider::with_subscription(subscription("unpaid"));

        let result = handler(&store, Some(provider)).handle(command("admin")).await.unwrap();

        assert!(result.matches);
        assert_eq!(result.expected_plan, Plan::Grace);
    }

    #[tokio::test]
    async fn non_admin_is_forbidden_before_processor_call() {
        let store = store_with_admin();
        store.insert_profile(ProfilePlan::new(uid("user_1")));
        let provider = MockPaymentProvider::with_subscription(subscription("active"));

        let err = handler(&store, Some(provider.clone()))
            .handle(command("user_1"))
            .await
            .unwrap_err();

        assert_eq!(err, BillingError::Forbidden);
        assert_eq!(provider.total_calls(), 0);
    }

    #[tokio::test]
    async fn forbidden_wins_over_invalid_input() {
        let store = store_with_admin();
        let mut cmd = command("user_1");
        cmd.subscription_id = None;

        let err = handler(&store, None).handle(cmd).await.unwrap_err();

        assert_eq!(err, BillingError::Forbidden);
    }

    #[tokio::test]
    async fn invalid_input_wins_over_missing_config() {
        let store = store_with_admin();
        let mut cmd = command("admin");
        cmd.user_id = None;

        let err = handler(&store, None).handle(cmd).await.unwrap_err();

        assert_eq!(err.code(), "INVALID_INPUT");
    }

    #[tokio::test]
    async fn missing_processor_key_is_config_error() {
        let store = store_with_admin();

        let err = handler(&store, None).handle(command("admin")).await.unwrap_err();

        assert_eq!(err.code(), "MISSING_CONFIG");
    }

    #[tokio::test]
    async fn unknown_subscription_is_not_found() {
        let store = store_with_admin();

        let err = handler(&store, Some(MockPaymentProvider::new()))
            .handle(command("admin"))
            .await
            .unwrap_err();

        assert_eq!(err, BillingError::SubscriptionNotFound("sub_123".to_string()));
    }

    #[tokio::test]
    async fn missing_profile_is_not_found() {
        let store = store_with_admin();
        let provider = MockPaymentProvider::with_subscription(subscription("active"));

        let err = handler(&store, Some(provider)).handle(command("admin")).await.unwrap_err();

        assert_eq!(err.code(), "PROFILE_NOT_FOUND");
    }

    #[tokio::test]
    async fn processor_failure_is_server_error() {
        let store = store_with_admin();
        let provider = MockPaymentProvider::new();
        provider.set_error(PaymentError::network("timeout"));

        let err = handler(&store, Some(provider)).handle(command("admin")).await.unwrap_err();

        assert_eq!(err.code(), "SERVER_ERROR");
    }
}
