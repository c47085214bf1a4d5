//! ListWebhookLogsHandler - recent webhook events that need attention.

use std::sync::Arc;

use crate::domain::billing::BillingError;
use crate::domain::foundation::AuthenticatedUser;
use crate::ports::{ProfileRepository, Severity, WebhookEventRecord, WebhookEventRepository};

use super::admin_access::require_admin;

pub const DEFAULT_LOG_LIMIT: u32 = 50;
pub const MAX_LOG_LIMIT: u32 = 200;

#[derive(Debug, Clone)]
pub struct ListWebhookLogsQuery {
    pub caller: AuthenticatedUser,
    pub limit: Option<u32>,
}

pub type ListWebhookLogsResult = Vec<WebhookEventRecord>;

/// Newest `warn` and `error` rows first.
pub struct ListWebhookLogsHandler {
    events: Arc<dyn WebhookEventRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

impl ListWebhookLogsHandler {
    pub fn new(
        events: Arc<dyn WebhookEventRepository>,
        profiles: Arc<dyn ProfileRepository>,
    ) -> Self {
        Self { events, profiles }
    }

    pub async fn handle(
        &self,
        query: ListWebhookLogsQuery,
    ) -> Result<ListWebhookLogsResult, BillingError> {
        require_admin(self.profiles.as_ref(), &query.caller).await?;

        let limit = query
            .limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_LOG_LIMIT)
            .min(MAX_LOG_LIMIT);

        self.events
            .list_recent(Severity::Warn, limit)
            .await
            .map_err(BillingError::query_failed)
    }
}
