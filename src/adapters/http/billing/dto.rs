//! HTTP DTOs for billing endpoints.
//!
//! Every body carries an `ok` flag. Failures share one shape:
//! `{ok:false, code, message}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::application::handlers::billing::{
    CancelSubscriptionResult, CheckPlanResult, ListSubscriptionsResult, ResyncPlanResult, SubscriptionOverview,
};
use crate::domain::billing::{Plan, ProfilePlan};
use crate::ports::WebhookEventRecord;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of the admin check and resync endpoints.
///
/// Both fields are optional here so that a missing field surfaces as
/// `INVALID_INPUT` after the admin check, not as a JSON rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminTargetRequest {
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl AdminTargetRequest {
    /// Parses a raw body; anything unreadable is treated as empty.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

/// Body of the self-service cancel endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelSubscriptionRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

impl CancelSubscriptionRequest {
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionListParams {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookLogParams {
    /// Kept as text so that a junk value falls back to the default.
    #[serde(default)]
    pub limit: Option<String>,
}

impl WebhookLogParams {
    pub fn limit(&self) -> Option<u32> {
        self.limit.as_deref().and_then(|l| l.trim().parse().ok())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MyPlanParams {
    /// `timeout` when the client gave up on an earlier poll.
    #[serde(default)]
    pub log: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Bare acknowledgement.
#[derive(Debug, Clone, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn new() -> Self {
        Self { ok: true }
    }
}

impl Default for OkResponse {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckPlanResponse {
    pub ok: bool,
    pub status: Option<String>,
    pub expected_plan: Plan,
    pub current_plan: Plan,
    pub matches: bool,
}

impl From<CheckPlanResult> for CheckPlanResponse {
    fn from(result: CheckPlanResult) -> Self {
        Self {
            ok: true,
            status: result.status,
            expected_plan: result.expected_plan,
            current_plan: result.current_plan,
            matches: result.matches,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResyncPlanResponse {
    pub ok: bool,
    pub status: Option<String>,
    pub plan: Plan,
}

impl From<ResyncPlanResult> for ResyncPlanResponse {
    fn from(result: ResyncPlanResult) -> Self {
        Self {
            ok: true,
            status: result.status,
            plan: result.plan,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelSubscriptionResponse {
    pub ok: bool,
    pub subscription_id: String,
    pub cancel_at_period_end: bool,
    pub current_period_end: Option<String>,
}

impl From<CancelSubscriptionResult> for CancelSubscriptionResponse {
    fn from(result: CancelSubscriptionResult) -> Self {
        Self {
            ok: true,
            subscription_id: result.subscription_id,
            cancel_at_period_end: result.cancel_at_period_end,
            current_period_end: result.current_period_end.map(|t| t.as_datetime().to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GraceExpireResponse {
    pub ok: bool,
    pub expired: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MyPlanResponse {
    pub ok: bool,
    pub plan: Plan,
    /// ISO 8601, or null if the profile was never written.
    pub updated_at: Option<String>,
    pub grace_ends_at: Option<String>,
    pub source: &'static str,
}

impl From<ProfilePlan> for MyPlanResponse {
    fn from(profile: ProfilePlan) -> Self {
        Self {
            ok: true,
            plan: profile.plan,
            updated_at: profile.updated_at.map(|t| t.as_datetime().to_rfc3339()),
            grace_ends_at: profile.grace_ends_at.map(|t| t.as_datetime().to_rfc3339()),
            source: "profiles",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionRowResponse {
    pub user_id: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: String,
    pub status: Option<String>,
    pub price_id: Option<String>,
    pub current_period_end: Option<String>,
    pub cancel_at_period_end: bool,
    pub updated_at: String,
    pub current_plan: Plan,
    pub expected_plan: Plan,
    pub mismatch: bool,
}

impl From<SubscriptionOverview> for SubscriptionRowResponse {
    fn from(row: SubscriptionOverview) -> Self {
        let sub = row.subscription;
        Self {
            user_id: sub.user_id.to_string(),
            stripe_customer_id: sub.stripe_customer_id,
            stripe_subscription_id: sub.stripe_subscription_id,
            status: sub.status.map(|s| s.as_str().to_string()),
            price_id: sub.price_id,
            current_period_end: sub.current_period_end.map(|t| t.as_datetime().to_rfc3339()),
            cancel_at_period_end: sub.cancel_at_period_end,
            updated_at: sub.updated_at.as_datetime().to_rfc3339(),
            current_plan: row.current_plan,
            expected_plan: row.expected_plan,
            mismatch: row.mismatch,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionListResponse {
    pub ok: bool,
    pub subscriptions: Vec<SubscriptionRowResponse>,
    pub status_counts: BTreeMap<String, u64>,
}

impl From<ListSubscriptionsResult> for SubscriptionListResponse {
    fn from(result: ListSubscriptionsResult) -> Self {
        Self {
            ok: true,
            subscriptions: result
                .subscriptions
                .into_iter()
                .map(SubscriptionRowResponse::from)
                .collect(),
            status_counts: result.status_counts,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookLogResponse {
    pub event_id: String,
    pub event_type: String,
    pub object_id: Option<String>,
    pub severity: String,
    pub message: String,
    pub created_at: String,
}

impl From<WebhookEventRecord> for WebhookLogResponse {
    fn from(record: WebhookEventRecord) -> Self {
        Self {
            event_id: record.event_id,
            event_type: record.event_type,
            object_id: record.object_id,
            severity: record.severity.as_str().to_string(),
            message: record.message,
            created_at: record.created_at.as_datetime().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookLogListResponse {
    pub ok: bool,
    pub logs: Vec<WebhookLogResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

// ════════════════════════════════════════════════════════════════════════════════
// Error DTO
// ════════════════════════════════════════════════════════════════════════════════

/// Standard error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            code: code.into(),
            message: message.into(),
        }
    }
}
