//! Billing handlers.
//!
//! Command and query handlers that keep the stored plan in line with the
//! payment processor:
//!
//! ## Commands
//! - Ingesting signed processor webhooks
//! - Admin plan resync for one subscription
//! - Expiring lapsed grace windows (cron)
//! - A user cancelling their own subscription at period end
//!
//! ## Queries
//! - Admin plan check against the live subscription
//! - The caller's own plan
//! - Admin subscription overview and webhook log

mod admin_access;
mod cancel_subscription;
mod check_plan;
mod expire_grace;
mod get_my_plan;
mod ingest_webhook;
mod list_subscriptions;
mod list_webhook_logs;
mod reconcile;
mod resync_plan;

pub use admin_access::{require_admin, AdminTarget};
pub use reconcile::EntitlementReconciler;

// Commands
pub use cancel_subscription::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult,
};
pub use expire_grace::{ExpireGraceCommand, ExpireGraceHandler, ExpireGraceResult};
pub use ingest_webhook::{IngestOutcome, IngestWebhookCommand, IngestWebhookHandler};
pub use resync_plan::{ResyncPlanCommand, ResyncPlanHandler, ResyncPlanResult};

// Queries
pub use check_plan::{CheckPlanCommand, CheckPlanHandler, CheckPlanResult};
pub use get_my_plan::{GetMyPlanHandler, GetMyPlanQuery, GetMyPlanResult};
pub use list_subscriptions::{
    ListSubscriptionsHandler, ListSubscriptionsQuery, ListSubscriptionsResult,
    SubscriptionOverview,
};
pub use list_webhook_logs::{
    ListWebhookLogsHandler, ListWebhookLogsQuery, ListWebhookLogsResult, DEFAULT_LOG_LIMIT,
    MAX_LOG_LIMIT,
};
