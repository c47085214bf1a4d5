//! Adapters - Implementations of port interfaces.
//!
//! - `auth` - Session token validation (HS256 JWT, mock)
//! - `http` - Axum routes, DTOs and middleware
//! - `memory` - In-memory store for tests and local runs
//! - `postgres` - PostgreSQL repositories
//! - `stripe` - Stripe REST client and mock

pub mod auth;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;

pub use auth::{JwtConfig, JwtSessionValidator, MockSessionValidator};
pub use memory::InMemoryBillingStore;
pub use postgres::{
    PostgresProfileRepository, PostgresSubscriptionRepository, PostgresWebhookEventRepository,
};
pub use stripe::{MockPaymentProvider, StripeConfig, StripePaymentAdapter};
