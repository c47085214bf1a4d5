//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, auth, errors)
//! - `billing` - Plans, subscription mirror, profile projection, Stripe webhooks

pub mod billing;
pub mod foundation;
