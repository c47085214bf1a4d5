//! CancelSubscriptionHandler - a user schedules their own subscription to end.
//!
//! The subscription id comes from the profile cache the reconciler maintains,
//! never from the request. Nothing is written locally: the processor sends a
//! `customer.subscription.updated` event that flows through the webhook.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::billing::BillingError;
use crate::domain::foundation::{AuthenticatedUser, Timestamp, UserId};
use crate::ports::{PaymentProvider, ProfileRepository};

#[derive(Debug, Clone)]
pub struct CancelSubscriptionCommand {
    pub caller: AuthenticatedUser,
    /// Must name the caller.
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelSubscriptionResult {
    pub subscription_id: String,
    pub cancel_at_period_end: bool,
    pub current_period_end: Option<Timestamp>,
}

pub struct CancelSubscriptionHandler {
    profiles: Arc<dyn ProfileRepository>,
    payment_provider: Option<Arc<dyn PaymentProvider>>,
}

impl CancelSubscriptionHandler {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        payment_provider: Option<Arc<dyn PaymentProvider>>,
    ) -> Self {
        Self {
            profiles,
            payment_provider,
        }
    }

    pub async fn handle(
        &self,
        cmd: CancelSubscriptionCommand,
    ) -> Result<CancelSubscriptionResult, BillingError> {
        let user_id = cmd
            .user_id
            .as_deref()
            .map(UserId::new)
            .and_then(Result::ok)
            .ok_or_else(|| BillingError::invalid_input("userId", "userId is required."))?;
        if user_id != cmd.caller.id {
            tracing::warn!(
                caller = %cmd.caller.id,
                target = %user_id,
                "Cancel requested for another user"
            );
            return Err(BillingError::NotOwner);
        }

        let provider = self
            .payment_provider
            .as_ref()
            .ok_or(BillingError::MissingConfig("STRIPE_SECRET_KEY"))?;

        let subscription_id = match self.profiles.find(&user_id).await {
            Ok(Some(profile)) => profile.stripe_subscription_id,
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Profile lookup failed");
                None
            }
        }
        .ok_or_else(|| BillingError::NotFound("Subscription not found.".to_string()))?;

        let subscription = provider
            .cancel_at_period_end(&subscription_id)
            .await
            .map_err(BillingError::internal)?
            .ok_or_else(|| BillingError::SubscriptionNotFound(subscription_id.clone()))?;

        tracing::info!(
            user_id = %user_id,
            subscription_id = %subscription_id,
            "Subscription set to cancel at period end"
        );

        Ok(CancelSubscriptionResult {
            subscription_id,
            cancel_at_period_end: subscription.cancel_at_period_end,
            current_period_end: subscription.current_period_end,
        })
    }
}
