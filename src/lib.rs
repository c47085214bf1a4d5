//! Billing Sync - Plan entitlement reconciliation
//!
//! Keeps each user's plan (`free`, `pro`, `grace`) consistent with the
//! payment processor's subscription state. Signed Stripe webhooks are
//! deduplicated and reconciled into a local subscription mirror and the
//! profile plan; a cron sweep expires lapsed grace windows; admins can
//! check and resync individual subscriptions.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
