//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` port for subscription reads.
//! Webhook verification lives in the billing domain; this module only talks
//! to the Stripe REST API.
//!
//! # Security
//!
//! The API key is held as a `secrecy::SecretString` and only exposed when
//! building the basic-auth header.

mod mock_payment_provider;
mod stripe_adapter;

pub use mock_payment_provider::{MethodCall, MockPaymentProvider};
pub use stripe_adapter::{StripeConfig, StripePaymentAdapter, DEFAULT_API_BASE_URL};
