//! HTTP handlers for billing endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use secrecy::SecretString;

use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::billing::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CheckPlanCommand, CheckPlanHandler, EntitlementReconciler, ExpireGraceCommand,
    ExpireGraceHandler, GetMyPlanHandler, GetMyPlanQuery, IngestWebhookCommand,
    IngestWebhookHandler, ListSubscriptionsHandler, ListSubscriptionsQuery,
    ListWebhookLogsHandler, ListWebhookLogsQuery, ResyncPlanCommand, ResyncPlanHandler,
};
use crate::domain::billing::{BillingError, GracePolicy, StripeWebhookVerifier, WebhookError};
use crate::ports::{
    PaymentProvider, ProfileRepository, SubscriptionRepository, WebhookEventRepository,
};

use super::dto::{
    AdminTargetRequest, CancelSubscriptionRequest, CancelSubscriptionResponse, CheckPlanResponse, ErrorResponse, GraceExpireResponse, HealthResponse,
    MyPlanParams, MyPlanResponse, OkResponse, ResyncPlanResponse, SubscriptionListParams,
    SubscriptionListResponse, WebhookLogListResponse, WebhookLogParams, WebhookLogResponse,
};

pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";
pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Optional members are unset when the matching secret is not configured;
/// the endpoints that need them answer `MISSING_CONFIG`.
#[derive(Clone)]
pub struct BillingAppState {
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub webhook_events: Arc<dyn WebhookEventRepository>,
    pub payment_provider: Option<Arc<dyn PaymentProvider>>,
    pub webhook_verifier: Option<StripeWebhookVerifier>,
    pub cron_secret: Option<SecretString>,
    pub grace_policy: GracePolicy,
}

impl BillingAppState {
    /// Create handlers on demand from the shared state.
    pub fn reconciler(&self) -> Arc<EntitlementReconciler> {
        Arc::new(EntitlementReconciler::new(
            self.subscriptions.clone(),
            self.profiles.clone(),
            self.grace_policy,
        ))
    }

    pub fn ingest_webhook_handler(&self) -> IngestWebhookHandler {
        IngestWebhookHandler::new(
            self.webhook_verifier.clone(),
            self.payment_provider.clone(),
            self.webhook_events.clone(),
            self.subscriptions.clone(),
            self.reconciler(),
        )
    }

    pub fn check_plan_handler(&self) -> CheckPlanHandler {
        CheckPlanHandler::new(self.profiles.clone(), self.payment_provider.clone())
    }

    pub fn resync_plan_handler(&self) -> ResyncPlanHandler {
        ResyncPlanHandler::new(
            self.profiles.clone(),
            self.payment_provider.clone(),
            self.reconciler(),
        )
    }

    pub fn expire_grace_handler(&self) -> ExpireGraceHandler {
        ExpireGraceHandler::new(self.profiles.clone(), self.cron_secret.clone())
    }

    pub fn cancel_subscription_handler(&self) -> CancelSubscriptionHandler {
        CancelSubscriptionHandler::new(self.profiles.clone(), self.payment_provider.clone())
    }

    pub fn my_plan_handler(&self) -> GetMyPlanHandler {
        GetMyPlanHandler::new(self.profiles.clone())
    }

    pub fn list_subscriptions_handler(&self) -> ListSubscriptionsHandler {
        ListSubscriptionsHandler::new(self.subscriptions.clone(), self.profiles.clone())
    }

    pub fn list_webhook_logs_handler(&self) -> ListWebhookLogsHandler {
        ListWebhookLogsHandler::new(self.webhook_events.clone(), self.profiles.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/stripe/webhook - Ingest a signed Stripe event
///
/// Every verified delivery is acknowledged with 200, including duplicates
/// and deliveries whose processing failed.
pub async fn stripe_webhook(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = IngestWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    let outcome = state.ingest_webhook_handler().handle(cmd).await?;
    tracing::debug!(?outcome, "Webhook acknowledged");

    Ok(Json(OkResponse::new()))
}

// ════════════════════════════════════════════════════════════════════════════════
// Admin
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/admin/subscriptions/check - Compare stored plan with the processor
pub async fn check_subscription(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
    body: Bytes,
) -> Result<impl IntoResponse, BillingApiError> {
    let request = AdminTargetRequest::from_body(&body);
    let cmd = CheckPlanCommand {
        caller: user,
        subscription_id: request.subscription_id,
        user_id: request.user_id,
    };

    let result = state.check_plan_handler().handle(cmd).await?;
    Ok(Json(CheckPlanResponse::from(result)))
}

/// POST /api/admin/subscriptions/resync - Rewrite the plan from the processor
pub async fn resync_subscription(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
    body: Bytes,
) -> Result<impl IntoResponse, BillingApiError> {
    let request = AdminTargetRequest::from_body(&body);
    let cmd = ResyncPlanCommand {
        caller: user,
        subscription_id: request.subscription_id,
        user_id: request.user_id,
    };

    let result = state.resync_plan_handler().handle(cmd).await?;
    Ok(Json(ResyncPlanResponse::from(result)))
}

/// GET /api/admin/subscriptions - Mirror rows with drift flags
pub async fn list_subscriptions(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
    Query(params): Query<SubscriptionListParams>,
) -> Result<impl IntoResponse, BillingApiError> {
    let query = ListSubscriptionsQuery {
        caller: user,
        status: params.status,
        query: params.q,
    };

    let result = state.list_subscriptions_handler().handle(query).await?;
    Ok(Json(SubscriptionListResponse::from(result)))
}

/// GET /api/admin/webhook-logs - Recent warn and error log rows
pub async fn list_webhook_logs(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
    Query(params): Query<WebhookLogParams>,
) -> Result<impl IntoResponse, BillingApiError> {
    let query = ListWebhookLogsQuery {
        caller: user,
        limit: params.limit(),
    };

    let rows = state.list_webhook_logs_handler().handle(query).await?;
    Ok(Json(WebhookLogListResponse {
        ok: true,
        logs: rows.into_iter().map(WebhookLogResponse::from).collect(),
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Cron
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/cron/grace-expire - Downgrade profiles whose grace window ended
pub async fn expire_grace(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, BillingApiError> {
    let cmd = ExpireGraceCommand {
        presented_secret: headers
            .get(CRON_SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    let result = state.expire_grace_handler().handle(cmd).await?;
    Ok(Json(GraceExpireResponse {
        ok: true,
        expired: result.expired,
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Self-service
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/me/plan - The caller's stored plan
pub async fn get_my_plan(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
    Query(params): Query<MyPlanParams>,
) -> Result<impl IntoResponse, BillingApiError> {
    let query = GetMyPlanQuery {
        user_id: user.id,
        client_timed_out: params.log.as_deref() == Some("timeout"),
    };

    let profile = state.my_plan_handler().handle(query).await?;
    Ok(Json(MyPlanResponse::from(profile)))
}

/// POST /api/stripe/cancel - Cancel the caller's subscription at period end
pub async fn cancel_subscription(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
    body: Bytes,
) -> Result<impl IntoResponse, BillingApiError> {
    let request = CancelSubscriptionRequest::from_body(&body);
    let cmd = CancelSubscriptionCommand {
        caller: user,
        user_id: request.user_id,
    };

    let result = state.cancel_subscription_handler().handle(cmd).await?;
    Ok(Json(CancelSubscriptionResponse::from(result)))
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Fallback for any method other than POST on POST-only routes.
pub async fn post_only() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST")],
        Json(ErrorResponse::new("METHOD_NOT_ALLOWED", "POST only")),
    )
        .into_response()
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts billing errors to HTTP responses.
#[derive(Debug)]
pub struct BillingApiError(BillingError);

impl From<BillingError> for BillingApiError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            BillingError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            BillingError::Forbidden | BillingError::NotOwner => StatusCode::FORBIDDEN,
            BillingError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            BillingError::SubscriptionNotFound(_)
            | BillingError::ProfileNotFound(_)
            | BillingError::NotFound(_) => StatusCode::NOT_FOUND,
            BillingError::MissingConfig(_)
            | BillingError::QueryFailed(_)
            | BillingError::UpdateFailed(_)
            | BillingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(code = self.0.code(), "{}", self.0.message());
        }

        let body = ErrorResponse::new(self.0.code(), self.0.message());
        (status, Json(body)).into_response()
    }
}

/// API error type for webhook rejections.
#[derive(Debug)]
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let code = match &self.0 {
            WebhookError::MissingSignature => "MISSING_SIGNATURE",
            WebhookError::MissingConfig(_) => "MISSING_CONFIG",
            e if e.is_verification_failure() => "INVALID_SIGNATURE",
            _ => "SERVER_ERROR",
        };
        let message = match &self.0 {
            WebhookError::MissingConfig(what) => format!("{} is not configured.", what),
            other => other.to_string(),
        };

        let status = self.0.status_code();
        if status.is_server_error() {
            tracing::error!(code, "{}", message);
        }

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}
