//! Billing domain module.
//!
//! Plan tiers, the status-to-plan mapping, the subscription mirror and
//! profile projection types, and Stripe webhook verification.
//!
//! # Module Structure
//!
//! - `errors` - Errors for admin, cron and plan reads
//! - `plan` - Plan tiers and `plan_for_status`
//! - `subscription` - Processor subscriptions and mirror rows
//! - `profile` - Profile plan projection, grace policy and plan writes
//! - `stripe_event` - Webhook envelope and the narrowed `BillingEvent`
//! - `webhook_verifier` - HMAC signature verification

mod errors;
mod plan;
mod profile;
mod secret;
mod stripe_event;
mod subscription;
mod webhook_errors;
mod webhook_verifier;

pub use errors::BillingError;
pub use plan::{plan_for_status, Plan};
pub use profile::{BillingIds, GracePolicy, GraceWindow, PlanUpdate, ProfilePlan};
pub use secret::constant_time_eq;
pub use stripe_event::{
    BillingEvent, CheckoutSessionObject, Expandable, InvoiceObject, StripeEvent, StripeEventData,
    StripeEventType, StripeSubscriptionObject,
};
pub use subscription::{
    ProcessorSubscription, SubscriptionFilter, SubscriptionRecord, SubscriptionSnapshot,
    SubscriptionStatus,
};
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{SignatureHeader, StripeWebhookVerifier};
