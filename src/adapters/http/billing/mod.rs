//! HTTP adapter for billing endpoints.
//!
//! - `POST /api/stripe/webhook` - Stripe event ingestion
//! - `POST /api/cron/grace-expire` - Grace expiry sweep
//! - `GET /api/me/plan` - Caller's plan
//! - `POST /api/admin/subscriptions/check` - Admin drift check
//! - `POST /api/admin/subscriptions/resync` - Admin resync
//! - `GET /api/admin/subscriptions` - Admin mirror overview
//! - `GET /api/admin/webhook-logs` - Admin webhook log
//! - `GET /health` - Liveness

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::ErrorResponse;
pub use handlers::{BillingApiError, BillingAppState, WebhookApiError};
pub use routes::billing_router;
