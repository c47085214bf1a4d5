//! Subscription state as seen by the payment processor and as mirrored locally.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::plan::{plan_for_status, Plan};
use crate::domain::foundation::{Timestamp, UserId};

/// Processor subscription status.
///
/// Kept as an opaque string: the processor adds values over time and the
/// mirror must store whatever it reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionStatus(String);

impl SubscriptionStatus {
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A subscription as reported by the processor, either inside a webhook
/// payload or fetched live from its API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorSubscription {
    pub id: String,
    pub customer_id: Option<String>,
    pub status: Option<SubscriptionStatus>,
    pub price_id: Option<String>,
    pub current_period_end: Option<Timestamp>,
    pub cancel_at_period_end: bool,
}

impl ProcessorSubscription {
    /// Returns the status as a plain string, if any.
    pub fn status_str(&self) -> Option<&str> {
        self.status.as_ref().map(SubscriptionStatus::as_str)
    }

    /// The plan this subscription entitles its owner to.
    pub fn expected_plan(&self) -> Plan {
        plan_for_status(self.status_str())
    }

    /// Builds the mirror row for this subscription owned by `user_id`.
    pub fn snapshot_for(&self, user_id: &UserId, at: Timestamp) -> SubscriptionSnapshot {
        SubscriptionSnapshot {
            user_id: user_id.clone(),
            stripe_customer_id: self.customer_id.clone(),
            stripe_subscription_id: self.id.clone(),
            status: self.status.clone(),
            price_id: self.price_id.clone(),
            current_period_end: self.current_period_end,
            cancel_at_period_end: self.cancel_at_period_end,
            updated_at: at,
        }
    }
}

/// One row of the local subscription mirror, keyed by
/// `stripe_subscription_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionSnapshot {
    /// Owner; fixed when the row is first created.
    pub user_id: UserId,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: String,
    pub status: Option<SubscriptionStatus>,
    pub price_id: Option<String>,
    pub current_period_end: Option<Timestamp>,
    pub cancel_at_period_end: bool,
    pub updated_at: Timestamp,
}

impl SubscriptionSnapshot {
    pub fn expected_plan(&self) -> Plan {
        plan_for_status(self.status.as_ref().map(SubscriptionStatus::as_str))
    }
}

/// A mirror row together with the columns only the store maintains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRecord {
    pub snapshot: SubscriptionSnapshot,
    /// First time a failed invoice payment was seen for this subscription.
    pub past_due_seen_at: Option<Timestamp>,
}

/// Filter for the admin subscription listing.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionFilter {
    /// Exact status match.
    pub status: Option<String>,
    /// Substring of the user id or the subscription id.
    pub query: Option<String>,
    pub limit: u32,
}

impl SubscriptionFilter {
    pub const MAX_LIMIT: u32 = 200;

    /// Returns true if `snapshot` passes the status and text filters.
    pub fn matches(&self, snapshot: &SubscriptionSnapshot) -> bool {
        let status_ok = match &self.status {
            Some(wanted) => snapshot.status.as_ref().map(SubscriptionStatus::as_str)
                == Some(wanted.as_str()),
            None => true,
        };
        let query_ok = match &self.query {
            Some(q) => {
                let q = q.to_lowercase();
                snapshot.user_id.as_str().to_lowercase().contains(&q)
                    || snapshot.stripe_subscription_id.to_lowercase().contains(&q)
            }
            None => true,
        };
        status_ok && query_ok
    }

    /// The effective row cap.
    pub fn effective_limit(&self) -> u32 {
        if self.limit == 0 {
            Self::MAX_LIMIT
        } else {
            self.limit.min(Self::MAX_LIMIT)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription(status: Option<&str>) -> ProcessorSubscription {
        ProcessorSubscription {
            id: "sub_123".to_string(),
            customer_id: Some("cus_1".to_string()),
            status: status.map(SubscriptionStatus::new),
            price_id: Some("price_pro".to_string()),
            current_period_end: Timestamp::from_unix_secs(1_800_000_000),
            cancel_at_period_end: false,
        }
    }

    #[test]
    fn expected_plan_uses_status() {
        assert_eq!(subscription(Some("active")).expected_plan(), Plan::Pro);
        assert_eq!(subscription(Some("past_due")).expected_plan(), Plan::Grace);
        assert_eq!(subscription(None).expected_plan(), Plan::Free);
    }

    #[test]
    fn snapshot_copies_mirrored_fields() {
        let user = UserId::new("user_1").unwrap();
        let at = Timestamp::now();
        let snapshot = subscription(Some("active")).snapshot_for(&user, at);

        assert_eq!(snapshot.user_id, user);
        assert_eq!(snapshot.stripe_subscription_id, "sub_123");
        assert_eq!(snapshot.stripe_customer_id.as_deref(), Some("cus_1"));
        assert_eq!(snapshot.status.as_ref().map(|s| s.as_str()), Some("active"));
        assert_eq!(snapshot.updated_at, at);
    }

    #[test]
    fn status_serializes_as_plain_string() {
        let json = serde_json::to_string(&SubscriptionStatus::new("paused")).unwrap();
        assert_eq!(json, "\"paused\"");
    }

    #[test]
    fn filter_matches_status_and_query() {
        let snapshot = subscription(Some("active"))
            .snapshot_for(&UserId::new("user_abc").unwrap(), Timestamp::now());

        let by_status = SubscriptionFilter {
            status: Some("active".to_string()),
            ..Default::default()
        };
        let wrong_status = SubscriptionFilter {
            status: Some("canceled".to_string()),
            ..Default::default()
        };
        let by_query = SubscriptionFilter {
            query: Some("SUB_1".to_string()),
            ..Default::default()
        };

        assert!(by_status.matches(&snapshot));
        assert!(!wrong_status.matches(&snapshot));
        assert!(by_query.matches(&snapshot));
    }

    #[test]
    fn filter_limit_is_capped() {
        let filter = SubscriptionFilter {
            limit: 5000,
            ..Default::default()
        };
        assert_eq!(filter.effective_limit(), 200);
        assert_eq!(SubscriptionFilter::default().effective_limit(), 200);
    }
}
