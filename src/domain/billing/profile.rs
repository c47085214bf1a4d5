//! The profile's plan projection and the writes that change it.

use chrono::Duration;
use serde::Serialize;

use super::plan::Plan;
use crate::domain::foundation::{Timestamp, UserId};

/// Plan-related columns of a user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfilePlan {
    pub user_id: UserId,
    pub plan: Plan,
    pub is_admin: bool,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub grace_started_at: Option<Timestamp>,
    pub grace_ends_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

impl ProfilePlan {
    /// A fresh `free` profile, as created at sign-up.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            plan: Plan::Free,
            is_admin: false,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            grace_started_at: None,
            grace_ends_at: None,
            updated_at: None,
        }
    }

    /// True when the profile is in grace and its window closed strictly
    /// before `now`. A grace profile without an end is never expired.
    pub fn grace_expired(&self, now: &Timestamp) -> bool {
        self.plan.is_grace() && self.grace_ends_at.map_or(false, |ends| ends.is_before(now))
    }

    /// Drops the profile to `free` and clears the grace window.
    pub fn expire_grace(&mut self, now: Timestamp) {
        self.plan = Plan::Free;
        self.grace_started_at = None;
        self.grace_ends_at = None;
        self.updated_at = Some(now);
    }
}

/// How long a profile stays in grace before the sweep downgrades it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GracePolicy {
    period: Duration,
}

impl GracePolicy {
    pub const DEFAULT_DAYS: u32 = 7;

    pub fn from_days(days: u32) -> Self {
        Self {
            period: Duration::days(i64::from(days)),
        }
    }

    /// The window that opens at `starts_at`.
    pub fn window_from(&self, starts_at: Timestamp) -> GraceWindow {
        GraceWindow {
            starts_at,
            ends_at: Timestamp::from_datetime(*starts_at.as_datetime() + self.period),
        }
    }
}

impl Default for GracePolicy {
    fn default() -> Self {
        Self::from_days(Self::DEFAULT_DAYS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraceWindow {
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
}

/// Processor identifiers cached on the profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingIds {
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: String,
}

/// A single write to a profile's plan columns.
///
/// Entering grace opens `grace_window` unless the profile already has one;
/// any other plan clears the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanUpdate {
    pub plan: Plan,
    /// `None` for the narrow plan-only write.
    pub billing_ids: Option<BillingIds>,
    pub grace_window: Option<GraceWindow>,
    pub at: Timestamp,
}

impl PlanUpdate {
    /// Full write: plan plus cached processor ids.
    pub fn new(plan: Plan, billing_ids: BillingIds, policy: &GracePolicy, at: Timestamp) -> Self {
        Self {
            plan,
            billing_ids: Some(billing_ids),
            grace_window: plan.is_grace().then(|| policy.window_from(at)),
            at,
        }
    }

    /// The same write without the processor ids.
    pub fn plan_only(&self) -> Self {
        Self {
            billing_ids: None,
            ..self.clone()
        }
    }

    /// Applies the write to a profile. Stores must produce the same result.
    pub fn apply_to(&self, profile: &mut ProfilePlan) {
        profile.plan = self.plan;
        if let Some(ids) = &self.billing_ids {
            profile.stripe_customer_id = ids.stripe_customer_id.clone();
            profile.stripe_subscription_id = Some(ids.stripe_subscription_id.clone());
        }
        match &self.grace_window {
            Some(window) => {
                if profile.grace_started_at.is_none() {
                    profile.grace_started_at = Some(window.starts_at);
                }
                if profile.grace_ends_at.is_none() {
                    profile.grace_ends_at = Some(window.ends_at);
                }
            }
            None => {
                profile.grace_started_at = None;
                profile.grace_ends_at = None;
            }
        }
        profile.updated_at = Some(self.at);
    }
}
