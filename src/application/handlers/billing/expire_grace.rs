//! ExpireGraceHandler - downgrades profiles whose grace window has closed.
//!
//! Triggered by an external scheduler holding the shared cron secret. A
//! profile in grace with no end date is never touched.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::domain::billing::{constant_time_eq, BillingError};
use crate::domain::foundation::Timestamp;
use crate::ports::ProfileRepository;

#[derive(Debug, Clone)]
pub struct ExpireGraceCommand {
    /// The `x-cron-secret` header, if present.
    pub presented_secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpireGraceResult {
    pub expired: u64,
}

pub struct ExpireGraceHandler {
    profiles: Arc<dyn ProfileRepository>,
    cron_secret: Option<SecretString>,
}

impl ExpireGraceHandler {
    pub fn new(profiles: Arc<dyn ProfileRepository>, cron_secret: Option<SecretString>) -> Self {
        Self {
            profiles,
            cron_secret,
        }
    }

    pub async fn handle(&self, cmd: ExpireGraceCommand) -> Result<ExpireGraceResult, BillingError> {
        self.expire_at(cmd, Timestamp::now()).await
    }

    async fn expire_at(
        &self,
        cmd: ExpireGraceCommand,
        now: Timestamp,
    ) -> Result<ExpireGraceResult, BillingError> {
        let expected = self
            .cron_secret
            .as_ref()
            .ok_or(BillingError::MissingConfig("CRON_SECRET"))?;

        let presented = cmd.presented_secret.unwrap_or_default();
        if !constant_time_eq(presented.as_bytes(), expected.expose_secret().as_bytes()) {
            tracing::warn!("Grace sweep called with invalid cron secret");
            return Err(BillingError::unauthorized("Invalid cron secret."));
        }

        let due = self
            .profiles
            .find_expired_grace(now)
            .await
            .map_err(BillingError::query_failed)?;

        if due.is_empty() {
            tracing::info!("Grace sweep found nothing to expire");
            return Ok(ExpireGraceResult { expired: 0 });
        }

        let expired = self
            .profiles
            .downgrade_to_free(&due, now)
            .await
            .map_err(BillingError::update_failed)?;

        tracing::info!(candidates = due.len(), expired, "Grace sweep finished");
        Ok(ExpireGraceResult { expired })
    }
}
