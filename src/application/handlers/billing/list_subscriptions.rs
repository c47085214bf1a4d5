//! ListSubscriptionsHandler - admin view of the mirror with drift flags.
//!
//! Each mirror row is paired with the owner's stored plan and the plan its
//! status implies; rows where the two differ are flagged.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;

use crate::domain::billing::{BillingError, Plan, SubscriptionFilter, SubscriptionSnapshot};
use crate::domain::foundation::{AuthenticatedUser, UserId};
use crate::ports::{ProfileRepository, SubscriptionRepository};

use super::admin_access::require_admin;

#[derive(Debug, Clone)]
pub struct ListSubscriptionsQuery {
    pub caller: AuthenticatedUser,
    /// Exact status; `None`, empty or `all` means no filter.
    pub status: Option<String>,
    /// Substring of user id or subscription id.
    pub query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionOverview {
    #[serde(flatten)]
    pub subscription: SubscriptionSnapshot,
    /// Plan on the owner's profile; `free` when there is no profile.
    pub current_plan: Plan,
    pub expected_plan: Plan,
    pub mismatch: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListSubscriptionsResult {
    pub subscriptions: Vec<SubscriptionOverview>,
    /// Rows per status among the listed rows; a null status counts as `unknown`.
    pub status_counts: BTreeMap<String, u64>,
}

pub struct ListSubscriptionsHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

impl ListSubscriptionsHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        profiles: Arc<dyn ProfileRepository>,
    ) -> Self {
        Self {
            subscriptions,
            profiles,
        }
    }

    pub async fn handle(
        &self,
        query: ListSubscriptionsQuery,
    ) -> Result<ListSubscriptionsResult, BillingError> {
        require_admin(self.profiles.as_ref(), &query.caller).await?;

        let filter = SubscriptionFilter {
            status: query
                .status
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty() && s != "all"),
            query: query
                .query
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty()),
            limit: SubscriptionFilter::MAX_LIMIT,
        };

        let rows = self
            .subscriptions
            .list(&filter)
            .await
            .map_err(BillingError::query_failed)?;

        let mut owners: Vec<UserId> = rows.iter().map(|r| r.user_id.clone()).collect();
        owners.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        owners.dedup();

        let plans: HashMap<UserId, Plan> = self
            .profiles
            .plans_for(&owners)
            .await
            .map_err(BillingError::query_failed)?
            .into_iter()
            .collect();

        let mut status_counts = BTreeMap::new();
        let subscriptions = rows
            .into_iter()
            .map(|row| {
                let key = row
                    .status
                    .as_ref()
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                *status_counts.entry(key).or_insert(0) += 1;

                let current_plan = plans.get(&row.user_id).copied().unwrap_or_default();
                let expected_plan = row.expected_plan();
                SubscriptionOverview {
                    subscription: row,
                    current_plan,
                    expected_plan,
                    mismatch: current_plan != expected_plan,
                }
            })
            .collect();

        Ok(ListSubscriptionsResult {
            subscriptions,
            status_counts,
        })
    }
}
