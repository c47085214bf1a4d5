//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Store Ports
//!
//! - `SubscriptionRepository` - Local mirror of processor subscriptions
//! - `ProfileRepository` - Plan columns of user profiles
//! - `WebhookEventRepository` - Webhook event log and idempotency ledger
//!
//! ## External Service Ports
//!
//! - `PaymentProvider` - Live subscription reads from the processor
//! - `SessionValidator` - Bearer token validation

mod payment_provider;
mod profile_repository;
mod session_validator;
mod subscription_repository;
mod webhook_event_repository;

pub use payment_provider::{PaymentError, PaymentErrorCode, PaymentProvider};
pub use profile_repository::ProfileRepository;
pub use session_validator::SessionValidator;
pub use subscription_repository::SubscriptionRepository;
pub use webhook_event_repository::{SaveResult, Severity, WebhookEventRecord, WebhookEventRepository};
