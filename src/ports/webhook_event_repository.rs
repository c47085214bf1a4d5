//! WebhookEventRepository port - the webhook event log.
//!
//! One row per Stripe event id. The row is inserted before any business
//! logic runs; a conflicting insert means the event was already delivered.
//! Later outcomes (unlinked subscription, handler failure) update the same
//! row in place.
//!
//! Stripe may deliver the same event more than once:
//! - network timeouts
//! - 5xx responses from our endpoint
//! - our 2xx response getting lost on the way back

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use crate::domain::foundation::{DomainError, Timestamp};

/// Outcome severity of a logged webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }

    /// Reads a stored severity; unknown values read as `info`.
    pub fn from_stored(value: &str) -> Self {
        match value {
            "warn" => Severity::Warn,
            "error" => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the webhook event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookEventRecord {
    /// Stripe event ID (evt_xxx format).
    pub event_id: String,
    pub event_type: String,
    /// The subscription, session or invoice id the event concerns.
    pub object_id: Option<String>,
    pub severity: Severity,
    pub message: String,
    pub created_at: Timestamp,
}

impl WebhookEventRecord {
    /// The row written when an event is first accepted.
    pub fn received(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        object_id: Option<String>,
    ) -> Self {
        let event_id = event_id.into();
        let event_type = event_type.into();
        let message = format!(
            "received event={} type={} object={}",
            event_id,
            event_type,
            object_id.as_deref().unwrap_or("none")
        );
        Self {
            event_id,
            event_type,
            object_id,
            severity: Severity::Info,
            message,
            created_at: Timestamp::now(),
        }
    }
}

/// Result of attempting to insert a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Record was inserted (first time seeing this event).
    Inserted,
    /// Record already exists (duplicate event).
    AlreadyExists,
}

/// Port for the webhook event log.
///
/// Implementations must make `insert_if_absent` atomic (a unique constraint
/// on `event_id`, not a read followed by a write).
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Inserts the record unless a row with the same event id exists.
    async fn insert_if_absent(&self, record: &WebhookEventRecord)
        -> Result<SaveResult, DomainError>;

    /// Updates severity and message of an existing row.
    async fn record_outcome(
        &self,
        event_id: &str,
        severity: Severity,
        message: &str,
    ) -> Result<(), DomainError>;

    /// Newest rows with at least `min_severity`, newest first.
    async fn list_recent(
        &self,
        min_severity: Severity,
        limit: u32,
    ) -> Result<Vec<WebhookEventRecord>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn received_record_formats_message() {
        let record = WebhookEventRecord::received(
            "evt_1",
            "customer.subscription.updated",
            Some("sub_123".to_string()),
        );

        assert_eq!(record.severity, Severity::Info);
        assert_eq!(
            record.message,
            "received event=evt_1 type=customer.subscription.updated object=sub_123"
        );
    }

    #[test]
    fn received_record_without_object_says_none() {
        let record = WebhookEventRecord::received("evt_2", "ping", None);
        assert!(record.message.ends_with("object=none"));
    }

    #[test]
    fn severity_round_trips_stored_values() {
        for severity in [Severity::Info, Severity::Warn, Severity::Error] {
            assert_eq!(Severity::from_stored(severity.as_str()), severity);
        }
        assert_eq!(Severity::from_stored("debug"), Severity::Info);
    }

    #[test]
    fn severity_orders_by_importance() {
        assert!(Severity::Error > Severity::Warn);
        assert!(Severity::Warn > Severity::Info);
    }
}
