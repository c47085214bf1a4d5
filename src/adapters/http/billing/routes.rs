//! Axum router configuration for billing endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::adapters::http::middleware::{auth_middleware, AuthState};

use super::handlers::{
    cancel_subscription, check_subscription, expire_grace, get_my_plan, health, list_subscriptions,
    list_webhook_logs, post_only, resync_subscription, stripe_webhook, BillingAppState,
};

/// Routes authenticated by a Bearer session token.
///
/// # Routes
/// - `GET /me/plan` - Caller's stored plan
/// - `POST /stripe/cancel` - Cancel the caller's subscription at period end
/// - `GET /admin/subscriptions` - Mirror overview (admin)
/// - `POST /admin/subscriptions/check` - Drift check (admin)
/// - `POST /admin/subscriptions/resync` - Plan resync (admin)
/// - `GET /admin/webhook-logs` - Recent warn/error events (admin)
pub fn session_routes(validator: AuthState) -> Router<BillingAppState> {
    Router::new()
        .route("/me/plan", get(get_my_plan))
        .route("/stripe/cancel", post(cancel_subscription).fallback(post_only))
        .route("/admin/subscriptions", get(list_subscriptions))
        .route(
            "/admin/subscriptions/check",
            post(check_subscription).fallback(post_only),
        )
        .route(
            "/admin/subscriptions/resync",
            post(resync_subscription).fallback(post_only),
        )
        .route("/admin/webhook-logs", get(list_webhook_logs))
        .route_layer(middleware::from_fn_with_state(validator, auth_middleware))
}

/// Routes authenticated by a shared secret rather than a session.
///
/// # Routes
/// - `POST /stripe/webhook` - Signed processor events
/// - `POST /cron/grace-expire` - Grace expiry sweep
pub fn machine_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/stripe/webhook", post(stripe_webhook).fallback(post_only))
        .route("/cron/grace-expire", post(expire_grace).fallback(post_only))
}

/// The complete application router, state applied.
///
/// # Example
///
/// ```ignore
/// let app = billing_router(state, validator);
/// axum::serve(listener, app).await?;
/// ```
pub fn billing_router(state: BillingAppState, validator: AuthState) -> Router {
    let api = Router::new()
        .merge(session_routes(validator))
        .merge(machine_routes());

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(state)
}
