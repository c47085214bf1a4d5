//! Stripe webhook event types.
//!
//! `StripeEvent` is the signed envelope. Its `data.object` stays untyped
//! until `StripeEvent::classify` narrows it, once, into a `BillingEvent`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::subscription::{ProcessorSubscription, SubscriptionStatus};
use super::webhook_errors::WebhookError;
use crate::domain::foundation::Timestamp;

/// Stripe webhook event envelope.
///
/// Only the fields we process are captured.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    #[serde(default)]
    pub created: i64,

    pub data: StripeEventData,

    #[serde(default)]
    pub livemode: bool,

    #[serde(default)]
    pub api_version: Option<String>,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: serde_json::Value,
}

/// Known Stripe event types that we handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeEventType {
    CustomerSubscriptionCreated,
    CustomerSubscriptionUpdated,
    CustomerSubscriptionDeleted,
    CheckoutSessionCompleted,
    InvoicePaymentSucceeded,
    InvoicePaymentFailed,
    Unknown,
}

impl StripeEventType {
    /// Parse event type from string.
    pub fn parse(s: &str) -> Self {
        match s {
            "customer.subscription.created" => Self::CustomerSubscriptionCreated,
            "customer.subscription.updated" => Self::CustomerSubscriptionUpdated,
            "customer.subscription.deleted" => Self::CustomerSubscriptionDeleted,
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "invoice.payment_succeeded" => Self::InvoicePaymentSucceeded,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            _ => Self::Unknown,
        }
    }

    /// Convert to the Stripe event type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomerSubscriptionCreated => "customer.subscription.created",
            Self::CustomerSubscriptionUpdated => "customer.subscription.updated",
            Self::CustomerSubscriptionDeleted => "customer.subscription.deleted",
            Self::CheckoutSessionCompleted => "checkout.session.completed",
            Self::InvoicePaymentSucceeded => "invoice.payment_succeeded",
            Self::InvoicePaymentFailed => "invoice.payment_failed",
            Self::Unknown => "unknown",
        }
    }
}

/// An event narrowed to the object shape its type implies.
#[derive(Debug, Clone)]
pub enum BillingEvent {
    /// `customer.subscription.{created,updated,deleted}`
    SubscriptionChanged(StripeSubscriptionObject),
    CheckoutCompleted(CheckoutSessionObject),
    InvoicePaid(InvoiceObject),
    InvoicePaymentFailed(InvoiceObject),
    /// Any other type; acknowledged without action.
    Unhandled,
}

impl StripeEvent {
    /// Parse the event type into a known enum variant.
    pub fn parsed_type(&self) -> StripeEventType {
        StripeEventType::parse(&self.event_type)
    }

    /// Id of the subscription, session or invoice the event concerns.
    pub fn object_id(&self) -> Option<&str> {
        self.data.object.get("id").and_then(|v| v.as_str())
    }

    /// Narrows `data.object` according to the event type.
    pub fn classify(&self) -> Result<BillingEvent, WebhookError> {
        let event = match self.parsed_type() {
            StripeEventType::CustomerSubscriptionCreated
            | StripeEventType::CustomerSubscriptionUpdated
            | StripeEventType::CustomerSubscriptionDeleted => {
                BillingEvent::SubscriptionChanged(self.object()?)
            }
            StripeEventType::CheckoutSessionCompleted => {
                BillingEvent::CheckoutCompleted(self.object()?)
            }
            StripeEventType::InvoicePaymentSucceeded => BillingEvent::InvoicePaid(self.object()?),
            StripeEventType::InvoicePaymentFailed => {
                BillingEvent::InvoicePaymentFailed(self.object()?)
            }
            StripeEventType::Unknown => BillingEvent::Unhandled,
        };
        Ok(event)
    }

    fn object<T: serde::de::DeserializeOwned>(&self) -> Result<T, WebhookError> {
        T::deserialize(&self.data.object).map_err(|e| WebhookError::MalformedObject {
            event_type: self.event_type.clone(),
            reason: e.to_string(),
        })
    }
}

/// A reference Stripe may send either as a bare id or as the expanded object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Expandable {
    Id(String),
    Object { id: String },
}

impl Expandable {
    pub fn id(&self) -> &str {
        match self {
            Expandable::Id(id) => id,
            Expandable::Object { id } => id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionItem {
    #[serde(default)]
    pub price: Option<StripePrice>,
    /// Newer API versions report the period per item.
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripePrice {
    pub id: String,
}

/// Stripe `subscription` object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionObject {
    pub id: String,
    #[serde(default)]
    pub customer: Option<Expandable>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub items: Option<StripeList<StripeSubscriptionItem>>,
    #[serde(default)]
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub cancel_at_period_end: Option<bool>,
}

impl StripeSubscriptionObject {
    fn first_item(&self) -> Option<&StripeSubscriptionItem> {
        self.items.as_ref().and_then(|items| items.data.first())
    }
}

impl From<StripeSubscriptionObject> for ProcessorSubscription {
    fn from(object: StripeSubscriptionObject) -> Self {
        let first_item = object.first_item();
        let price_id = first_item
            .and_then(|item| item.price.as_ref())
            .map(|price| price.id.clone());
        let period_end = object
            .current_period_end
            .or_else(|| first_item.and_then(|item| item.current_period_end));

        ProcessorSubscription {
            customer_id: object.customer.as_ref().map(|c| c.id().to_string()),
            status: object.status.map(SubscriptionStatus::new),
            price_id,
            current_period_end: period_end.and_then(Timestamp::from_unix_secs),
            cancel_at_period_end: object.cancel_at_period_end.unwrap_or(false),
            id: object.id,
        }
    }
}

/// Stripe `checkout.session` object.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
    #[serde(default)]
    pub subscription: Option<Expandable>,
}

impl CheckoutSessionObject {
    /// The `metadata.user_id` the checkout was created with.
    pub fn user_id(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("user_id"))
            .map(String::as_str)
            .filter(|id| !id.trim().is_empty())
    }

    pub fn subscription_id(&self) -> Option<&str> {
        self.subscription.as_ref().map(Expandable::id)
    }
}

/// Stripe `invoice` object.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceObject {
    pub id: String,
    #[serde(default)]
    pub subscription: Option<Expandable>,
    /// Newer API versions move the subscription under `parent`.
    #[serde(default)]
    pub parent: Option<InvoiceParent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceParent {
    #[serde(default)]
    pub subscription_details: Option<InvoiceSubscriptionDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceSubscriptionDetails {
    #[serde(default)]
    pub subscription: Option<Expandable>,
}

impl InvoiceObject {
    pub fn subscription_id(&self) -> Option<&str> {
        self.subscription
            .as_ref()
            .or_else(|| {
                self.parent
                    .as_ref()
                    .and_then(|p| p.subscription_details.as_ref())
                    .and_then(|d| d.subscription.as_ref())
            })
            .map(Expandable::id)
    }
}
