//! IngestWebhookHandler - verifies, deduplicates and dispatches Stripe events.
//!
//! ## Flow
//!
//! 1. Refuse to run without the signing secret and the API key.
//! 2. Verify the `stripe-signature` header; any failure rejects the delivery
//!    before a single store write.
//! 3. Insert the event id into the event log. An existing row means a
//!    redelivery: acknowledge and stop.
//! 4. Narrow the payload to a `BillingEvent` and dispatch.
//! 5. Dispatch errors are recorded on the log row and the delivery is still
//!    acknowledged.

use std::sync::Arc;

use crate::domain::billing::{
    BillingEvent, CheckoutSessionObject, InvoiceObject, ProcessorSubscription, StripeEvent,
    StripeSubscriptionObject, StripeWebhookVerifier, WebhookError,
};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{
    PaymentProvider, SaveResult, Severity, SubscriptionRepository, WebhookEventRecord,
    WebhookEventRepository,
};

use super::EntitlementReconciler;

/// A raw webhook delivery.
#[derive(Debug, Clone)]
pub struct IngestWebhookCommand {
    /// Request body, exactly as received.
    pub payload: Vec<u8>,
    /// The `stripe-signature` header, if present.
    pub signature: Option<String>,
}

/// How an accepted delivery ended. Every variant is acknowledged with 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Handled; the log row stays `info`.
    Processed,
    /// Event type we do not act on.
    Ignored,
    /// Event id already logged.
    Duplicate,
    /// Acknowledged without action; the log row was raised to this severity.
    Flagged(Severity),
    /// Dispatch failed; recorded as `error`.
    Failed(String),
}

/// Result of dispatching one event.
enum Dispatch {
    Done,
    Ignored,
    Flag(Severity, String),
}

pub struct IngestWebhookHandler {
    verifier: Option<StripeWebhookVerifier>,
    payment_provider: Option<Arc<dyn PaymentProvider>>,
    events: Arc<dyn WebhookEventRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    reconciler: Arc<EntitlementReconciler>,
}

impl IngestWebhookHandler {
    pub fn new(
        verifier: Option<StripeWebhookVerifier>,
        payment_provider: Option<Arc<dyn PaymentProvider>>,
        events: Arc<dyn WebhookEventRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        reconciler: Arc<EntitlementReconciler>,
    ) -> Self {
        Self {
            verifier,
            payment_provider,
            events,
            subscriptions,
            reconciler,
        }
    }

    /// Processes one delivery.
    ///
    /// # Errors
    ///
    /// Only configuration and verification failures are returned; everything
    /// after verification is folded into an `IngestOutcome`.
    pub async fn handle(&self, cmd: IngestWebhookCommand) -> Result<IngestOutcome, WebhookError> {
        let verifier = self
            .verifier
            .as_ref()
            .ok_or(WebhookError::MissingConfig("STRIPE_WEBHOOK_SECRET"))?;
        let provider = self
            .payment_provider
            .as_deref()
            .ok_or(WebhookError::MissingConfig("STRIPE_SECRET_KEY"))?;

        let signature = cmd
            .signature
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(WebhookError::MissingSignature)?;

        let event = verifier
            .verify_and_parse(&cmd.payload, signature)
            .map_err(|e| {
                tracing::warn!(error = %e, "Rejected webhook delivery");
                e
            })?;

        let object_id = event.object_id().map(str::to_string);
        let record = WebhookEventRecord::received(&event.id, &event.event_type, object_id.clone());
        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            livemode = event.livemode,
            "{}",
            record.message
        );

        match self.events.insert_if_absent(&record).await {
            Ok(SaveResult::Inserted) => {}
            Ok(SaveResult::AlreadyExists) => {
                tracing::info!(event_id = %event.id, "Duplicate webhook event, skipping");
                return Ok(IngestOutcome::Duplicate);
            }
            Err(e) => {
                tracing::error!(
                    event_id = %event.id,
                    error = %e,
                    "Webhook log insert failed, processing anyway"
                );
            }
        }

        let outcome = match self.dispatch(provider, &event).await {
            Ok(Dispatch::Done) => IngestOutcome::Processed,
            Ok(Dispatch::Ignored) => IngestOutcome::Ignored,
            Ok(Dispatch::Flag(severity, message)) => {
                self.flag(&event, severity, &message).await;
                IngestOutcome::Flagged(severity)
            }
            Err(err) => {
                let message = format!(
                    "Handler failure. event={} type={} object={}: {}",
                    event.id,
                    event.event_type,
                    object_id.as_deref().unwrap_or("none"),
                    err
                );
                self.flag(&event, Severity::Error, &message).await;
                IngestOutcome::Failed(err.to_string())
            }
        };

        Ok(outcome)
    }

    async fn dispatch(
        &self,
        provider: &dyn PaymentProvider,
        event: &StripeEvent,
    ) -> Result<Dispatch, WebhookError> {
        match event.classify()? {
            BillingEvent::SubscriptionChanged(object) => {
                self.on_subscription_changed(event, object).await
            }
            BillingEvent::CheckoutCompleted(session) => {
                self.on_checkout_completed(provider, event, session).await
            }
            BillingEvent::InvoicePaid(invoice) => {
                self.on_invoice_paid(provider, event, invoice).await
            }
            BillingEvent::InvoicePaymentFailed(invoice) => {
                self.on_invoice_payment_failed(provider, event, invoice).await
            }
            BillingEvent::Unhandled => {
                tracing::debug!(event_type = %event.event_type, "Unhandled event type");
                Ok(Dispatch::Ignored)
            }
        }
    }

    async fn on_subscription_changed(
        &self,
        event: &StripeEvent,
        object: StripeSubscriptionObject,
    ) -> Result<Dispatch, WebhookError> {
        let subscription = ProcessorSubscription::from(object);
        let Some(user_id) = self.owner_of(&subscription.id).await? else {
            return Ok(unlinked(event, &subscription.id));
        };

        self.reconciler.reconcile(&subscription, &user_id, true).await?;
        Ok(Dispatch::Done)
    }

    async fn on_checkout_completed(
        &self,
        provider: &dyn PaymentProvider,
        event: &StripeEvent,
        session: CheckoutSessionObject,
    ) -> Result<Dispatch, WebhookError> {
        let user_id = match session.user_id().map(UserId::new) {
            Some(Ok(user_id)) => user_id,
            _ => {
                let message = format!(
                    "Missing session.metadata.user_id. event={} type={} object={}",
                    event.id, event.event_type, session.id
                );
                tracing::error!("{}", message);
                return Ok(Dispatch::Flag(Severity::Error, message));
            }
        };

        let Some(subscription_id) = session.subscription_id() else {
            tracing::info!(session_id = %session.id, "Checkout without subscription");
            return Ok(Dispatch::Done);
        };

        let subscription = provider
            .get_subscription(subscription_id)
            .await?
            .ok_or_else(|| WebhookError::SubscriptionNotFound(subscription_id.to_string()))?;

        self.reconciler.reconcile(&subscription, &user_id, true).await?;
        Ok(Dispatch::Done)
    }

    async fn on_invoice_paid(
        &self,
        provider: &dyn PaymentProvider,
        event: &StripeEvent,
        invoice: InvoiceObject,
    ) -> Result<Dispatch, WebhookError> {
        let Some(subscription_id) = invoice.subscription_id() else {
            tracing::debug!(invoice_id = %invoice.id, "Invoice without subscription");
            return Ok(Dispatch::Done);
        };

        let subscription = provider
            .get_subscription(subscription_id)
            .await?
            .ok_or_else(|| WebhookError::SubscriptionNotFound(subscription_id.to_string()))?;

        let Some(user_id) = self.owner_of(&subscription.id).await? else {
            return Ok(unlinked(event, &subscription.id));
        };

        self.reconciler.reconcile(&subscription, &user_id, true).await?;
        Ok(Dispatch::Done)
    }

    /// Mirrors the subscription without touching the plan; the status
    /// change Stripe sends next moves the plan.
    async fn on_invoice_payment_failed(
        &self,
        provider: &dyn PaymentProvider,
        event: &StripeEvent,
        invoice: InvoiceObject,
    ) -> Result<Dispatch, WebhookError> {
        let Some(subscription_id) = invoice.subscription_id() else {
            tracing::debug!(invoice_id = %invoice.id, "Invoice without subscription");
            return Ok(Dispatch::Done);
        };

        let subscription = provider
            .get_subscription(subscription_id)
            .await?
            .ok_or_else(|| WebhookError::SubscriptionNotFound(subscription_id.to_string()))?;

        if let Some(user_id) = self.owner_of(&subscription.id).await? {
            self.reconciler.reconcile(&subscription, &user_id, false).await?;
        }

        if let Err(e) = self
            .subscriptions
            .mark_past_due_seen(subscription_id, Timestamp::now())
            .await
        {
            tracing::warn!(
                subscription_id,
                error = %e,
                "Failed to stamp past_due_seen_at"
            );
        }

        tracing::warn!(
            "Invoice payment failed. event={} type={} object={}",
            event.id,
            event.event_type,
            subscription_id
        );
        Ok(Dispatch::Done)
    }

    async fn owner_of(&self, subscription_id: &str) -> Result<Option<UserId>, WebhookError> {
        Ok(self.subscriptions.find_user_id(subscription_id).await?)
    }

    /// Raises the event's log row. Failures here are only logged.
    async fn flag(&self, event: &StripeEvent, severity: Severity, message: &str) {
        if let Err(e) = self.events.record_outcome(&event.id, severity, message).await {
            tracing::error!(event_id = %event.id, error = %e, "Failed to update webhook log");
        }
    }
}

fn unlinked(event: &StripeEvent, subscription_id: &str) -> Dispatch {
    let message = format!(
        "No user match for subscription. event={} type={} object={}",
        event.id, event.event_type, subscription_id
    );
    tracing::warn!("{}", message);
    Dispatch::Flag(Severity::Warn, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryBillingStore;
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::domain::billing::{
        GracePolicy, Plan, ProfilePlan, SubscriptionRecord, SubscriptionStatus,
    };
    use crate::ports::PaymentError;

    const SECRET: &str = "whsec_test_secret";

    struct Harness {
        store: InMemoryBillingStore,
        provider: MockPaymentProvider,
        handler: IngestWebhookHandler,
    }

    fn harness() -> Harness {
        let store = InMemoryBillingStore::new();
        let provider = MockPaymentProvider::new();
        let reconciler = Arc::new(EntitlementReconciler::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            GracePolicy::default(),
        ));
        let handler = IngestWebhookHandler::new(
            Some(StripeWebhookVerifier::new(SECRET)),
            Some(Arc::new(provider.clone())),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            reconciler,
        );
        Harness {
            store,
            provider,
            handler,
        }
    }

    fn user() -> UserId {
        UserId::new("user_1").unwrap()
    }

    fn event_json(id: &str, event_type: &str, object: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "id": id,
            "type": event_type,
            "created": 1_704_067_200,
            "livemode": false,
            "data": { "object": object }
        }))
        .unwrap()
    }

    fn signed(payload: Vec<u8>) -> IngestWebhookCommand {
        let t = chrono::Utc::now().timestamp();
        let sig = StripeWebhookVerifier::new(SECRET).sign(t, &payload).unwrap();
        IngestWebhookCommand {
            payload,
            signature: Some(format!("t={},v1={}", t, sig)),
        }
    }

    fn sub_object(status: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "sub_123",
            "object": "subscription",
            "customer": "cus_1",
            "status": status,
            "cancel_at_period_end": false,
            "items": {"data": [{"price": {"id": "price_pro"}}]}
        })
    }

    fn processor_sub(status: &str) -> ProcessorSubscription {
        ProcessorSubscription {
            id: "sub_123".to_string(),
            customer_id: Some("cus_1".to_string()),
            status: Some(SubscriptionStatus::new(status)),
            price_id: Some("price_pro".to_string()),
            current_period_end: None,
            cancel_at_period_end: false,
        }
    }

    /// Profile `user_1` on `plan`, linked to `sub_123` in the mirror.
    fn seed_linked(store: &InMemoryBillingStore, plan: Plan, status: &str) {
        let mut profile = ProfilePlan::new(user());
        profile.plan = plan;
        store.insert_profile(profile);
        store.insert_subscription(SubscriptionRecord {
            snapshot: processor_sub(status).snapshot_for(&user(), Timestamp::now()),
            past_due_seen_at: None,
        });
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Verification
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn missing_signature_is_rejected_without_writes() {
        let h = harness();
        let cmd = IngestWebhookCommand {
            payload: event_json("evt_1", "customer.subscription.updated", sub_object("active")),
            signature: None,
        };

        let err = h.handler.handle(cmd).await.unwrap_err();

        assert!(matches!(err, WebhookError::MissingSignature));
        assert_eq!(h.store.mutations().total(), 0);
    }

    #[tokio::test]
    async fn tampered_body_is_rejected_without_writes() {
        let h = harness();
        seed_linked(&h.store, Plan::Free, "incomplete");
        let mut cmd = signed(event_json(
            "evt_1",
            "customer.subscription.updated",
            sub_object("active"),
        ));
        cmd.payload = event_json("evt_1", "customer.subscription.updated", sub_object("trialing"));

        let err = h.handler.handle(cmd).await.unwrap_err();

        assert!(err.is_verification_failure());
        assert_eq!(h.store.mutations().total(), 0);
        assert_eq!(h.store.webhook_log_count(), 0);
        assert_eq!(h.store.profile(&user()).unwrap().plan, Plan::Free);
    }

    #[tokio::test]
    async fn missing_secret_is_a_config_error() {
        let store = InMemoryBillingStore::new();
        let reconciler = Arc::new(EntitlementReconciler::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            GracePolicy::default(),
        ));
        let handler = IngestWebhookHandler::new(
            None,
            Some(Arc::new(MockPaymentProvider::new())),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            reconciler,
        );

        let err = handler
            .handle(signed(event_json("evt_1", "ping", serde_json::json!({}))))
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::MissingConfig(_)));
        assert!(!err.is_verification_failure());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Deduplication
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn redelivery_has_single_side_effect() {
        let h = harness();
        seed_linked(&h.store, Plan::Free, "incomplete");
        let payload = event_json("evt_1", "customer.subscription.updated", sub_object("active"));

        let first = h.handler.handle(signed(payload.clone())).await.unwrap();
        let after_first = h.store.mutations();
        let second = h.handler.handle(signed(payload)).await.unwrap();

        assert_eq!(first, IngestOutcome::Processed);
        assert_eq!(second, IngestOutcome::Duplicate);
        assert_eq!(h.store.mutations(), after_first);
        assert_eq!(h.store.webhook_log_count(), 1);
    }

    #[tokio::test]
    async fn log_insert_failure_still_processes() {
        let h = harness();
        seed_linked(&h.store, Plan::Free, "incomplete");
        h.store.fail_webhook_log_inserts(true);

        let outcome = h
            .handler
            .handle(signed(event_json(
                "evt_1",
                "customer.subscription.updated",
                sub_object("active"),
            )))
            .await
            .unwrap();

        assert_eq!(outcome, IngestOutcome::Processed);
        assert_eq!(h.store.profile(&user()).unwrap().plan, Plan::Pro);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Subscription Events
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn subscription_update_for_known_user_sets_plan() {
        let h = harness();
        seed_linked(&h.store, Plan::Free, "incomplete");

        let outcome = h
            .handler
            .handle(signed(event_json(
                "evt_1",
                "customer.subscription.updated",
                sub_object("active"),
            )))
            .await
            .unwrap();

        assert_eq!(outcome, IngestOutcome::Processed);
        assert_eq!(h.store.profile(&user()).unwrap().plan, Plan::Pro);
        assert_eq!(h.store.webhook_log("evt_1").unwrap().severity, Severity::Info);
        assert_eq!(h.provider.total_calls(), 0);
    }

    #[tokio::test]
    async fn subscription_deleted_drops_to_free() {
        let h = harness();
        seed_linked(&h.store, Plan::Pro, "active");

        h.handler
            .handle(signed(event_json(
                "evt_del",
                "customer.subscription.deleted",
                sub_object("canceled"),
            )))
            .await
            .unwrap();

        assert_eq!(h.store.profile(&user()).unwrap().plan, Plan::Free);
        assert_eq!(
            h.store.subscription("sub_123").unwrap().snapshot.status.unwrap().as_str(),
            "canceled"
        );
    }

    #[tokio::test]
    async fn unlinked_subscription_is_flagged_warn() {
        let h = harness();

        let outcome = h
            .handler
            .handle(signed(event_json(
                "evt_2",
                "customer.subscription.created",
                sub_object("active"),
            )))
            .await
            .unwrap();

        assert_eq!(outcome, IngestOutcome::Flagged(Severity::Warn));
        let log = h.store.webhook_log("evt_2").unwrap();
        assert_eq!(log.severity, Severity::Warn);
        assert_eq!(
            log.message,
            "No user match for subscription. event=evt_2 type=customer.subscription.created object=sub_123"
        );
        assert_eq!(h.store.subscription_count(), 0);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Checkout
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn checkout_links_new_subscription_to_user() {
        let h = harness();
        h.store.insert_profile(ProfilePlan::new(user()));
        h.provider.add_subscription(processor_sub("active"));

        let outcome = h
            .handler
            .handle(signed(event_json(
                "evt_3",
                "checkout.session.completed",
                serde_json::json!({
                    "id": "cs_1",
                    "metadata": {"user_id": "user_1"},
                    "subscription": "sub_123"
                }),
            )))
            .await
            .unwrap();

        assert_eq!(outcome, IngestOutcome::Processed);
        assert_eq!(h.provider.call_count("get_subscription"), 1);
        assert_eq!(
            h.store.subscription("sub_123").unwrap().snapshot.user_id,
            user()
        );
        assert_eq!(h.store.profile(&user()).unwrap().plan, Plan::Pro);
    }

    #[tokio::test]
    async fn checkout_without_user_metadata_is_flagged_error() {
        let h = harness();

        let outcome = h
            .handler
            .handle(signed(event_json(
                "evt_4",
                "checkout.session.completed",
                serde_json::json!({"id": "cs_2", "metadata": {}, "subscription": "sub_123"}),
            )))
            .await
            .unwrap();

        assert_eq!(outcome, IngestOutcome::Flagged(Severity::Error));
        let log = h.store.webhook_log("evt_4").unwrap();
        assert!(log.message.starts_with("Missing session.metadata.user_id. event=evt_4"));
        assert_eq!(h.provider.total_calls(), 0);
    }

    #[tokio::test]
    async fn checkout_without_subscription_is_acknowledged() {
        let h = harness();

        let outcome = h
            .handler
            .handle(signed(event_json(
                "evt_5",
                "checkout.session.completed",
                serde_json::json!({"id": "cs_3", "metadata": {"user_id": "user_1"}}),
            )))
            .await
            .unwrap();

        assert_eq!(outcome, IngestOutcome::Processed);
        assert_eq!(h.provider.total_calls(), 0);
        assert_eq!(h.store.subscription_count(), 0);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Invoices
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn payment_failed_keeps_plan_then_status_update_enters_grace() {
        let h = harness();
        seed_linked(&h.store, Plan::Pro, "active");
        h.provider.add_subscription(processor_sub("past_due"));

        h.handler
            .handle(signed(event_json(
                "evt_6",
                "invoice.payment_failed",
                serde_json::json!({"id": "in_1", "subscription": "sub_123"}),
            )))
            .await
            .unwrap();

        assert_eq!(h.store.profile(&user()).unwrap().plan, Plan::Pro);
        let mirror = h.store.subscription("sub_123").unwrap();
        assert!(mirror.past_due_seen_at.is_some());
        assert_eq!(mirror.snapshot.status.unwrap().as_str(), "past_due");

        h.handler
            .handle(signed(event_json(
                "evt_7",
                "customer.subscription.updated",
                sub_object("past_due"),
            )))
            .await
            .unwrap();

        let profile = h.store.profile(&user()).unwrap();
        assert_eq!(profile.plan, Plan::Grace);
        assert!(profile.grace_ends_at.is_some());
    }

    #[tokio::test]
    async fn invoice_paid_reads_subscription_under_parent() {
        let h = harness();
        seed_linked(&h.store, Plan::Grace, "past_due");
        h.provider.add_subscription(processor_sub("active"));

        h.handler
            .handle(signed(event_json(
                "evt_8",
                "invoice.payment_succeeded",
                serde_json::json!({
                    "id": "in_2",
                    "parent": {"subscription_details": {"subscription": "sub_123"}}
                }),
            )))
            .await
            .unwrap();

        assert_eq!(h.store.profile(&user()).unwrap().plan, Plan::Pro);
    }

    #[tokio::test]
    async fn invoice_paid_for_unknown_owner_is_flagged_warn() {
        let h = harness();
        h.provider.add_subscription(processor_sub("active"));

        let outcome = h
            .handler
            .handle(signed(event_json(
                "evt_9",
                "invoice.payment_succeeded",
                serde_json::json!({"id": "in_3", "subscription": "sub_123"}),
            )))
            .await
            .unwrap();

        assert_eq!(outcome, IngestOutcome::Flagged(Severity::Warn));
        assert_eq!(h.store.subscription_count(), 0);
    }

    #[tokio::test]
    async fn invoice_without_subscription_is_acknowledged() {
        let h = harness();

        let outcome = h
            .handler
            .handle(signed(event_json(
                "evt_10",
                "invoice.payment_succeeded",
                serde_json::json!({"id": "in_4"}),
            )))
            .await
            .unwrap();

        assert_eq!(outcome, IngestOutcome::Processed);
        assert_eq!(h.provider.total_calls(), 0);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Failures and Unhandled Types
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn processor_failure_is_logged_and_acknowledged() {
        let h = harness();
        h.provider.fail_always(PaymentError::network("connection reset"));

        let outcome = h
            .handler
            .handle(signed(event_json(
                "evt_11",
                "invoice.payment_succeeded",
                serde_json::json!({"id": "in_5", "subscription": "sub_123"}),
            )))
            .await
            .unwrap();

        assert!(matches!(outcome, IngestOutcome::Failed(_)));
        let log = h.store.webhook_log("evt_11").unwrap();
        assert_eq!(log.severity, Severity::Error);
        assert!(log
            .message
            .starts_with("Handler failure. event=evt_11 type=invoice.payment_succeeded object=in_5: "));
    }

    #[tokio::test]
    async fn malformed_object_is_a_handler_failure() {
        let h = harness();

        let outcome = h
            .handler
            .handle(signed(event_json(
                "evt_12",
                "customer.subscription.updated",
                serde_json::json!({"status": "active"}),
            )))
            .await
            .unwrap();

        assert!(matches!(outcome, IngestOutcome::Failed(_)));
        assert_eq!(h.store.webhook_log("evt_12").unwrap().severity, Severity::Error);
    }

    #[tokio::test]
    async fn unknown_type_is_ignored_with_info_row() {
        let h = harness();

        let outcome = h
            .handler
            .handle(signed(event_json(
                "evt_13",
                "customer.created",
                serde_json::json!({"id": "cus_1"}),
            )))
            .await
            .unwrap();

        assert_eq!(outcome, IngestOutcome::Ignored);
        let log = h.store.webhook_log("evt_13").unwrap();
        assert_eq!(log.severity, Severity::Info);
        assert_eq!(log.message, "received event=evt_13 type=customer.created object=cus_1");
    }
}
