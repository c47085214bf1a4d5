//! Mock payment provider for testing.
//!
//! Provides a configurable mock implementation of `PaymentProvider` for unit
//! and integration tests. Supports:
//! - Pre-configured subscriptions
//! - Error injection
//! - Call tracking
//!
//! Lock operations use `.expect()`; a poisoned lock panics the test.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::billing::ProcessorSubscription;
use crate::ports::{PaymentError, PaymentProvider};

/// Mock payment provider for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentProvider::new();
/// mock.add_subscription(subscription);
/// mock.set_error(PaymentError::network("down"));
/// assert_eq!(mock.call_count("get_subscription"), 0);
/// ```
#[derive(Default, Clone)]
pub struct MockPaymentProvider {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    subscriptions: HashMap<String, ProcessorSubscription>,
    /// Error to return on the next call (consumed).
    next_error: Option<PaymentError>,
    /// Error returned on every call until cleared.
    sticky_error: Option<PaymentError>,
    call_log: Vec<MethodCall>,
}

impl MockState {
    /// Records the call, then returns any injected error.
    fn begin_call(&mut self, method: &str, arg: &str) -> Result<(), PaymentError> {
        self.call_log.push(MethodCall {
            method: method.to_string(),
            args: vec![arg.to_string()],
        });

        if let Some(error) = self.sticky_error.clone() {
            return Err(error);
        }
        match self.next_error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Recorded method call for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider that already knows `subscription`.
    pub fn with_subscription(subscription: ProcessorSubscription) -> Self {
        let mock = Self::new();
        mock.add_subscription(subscription);
        mock
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().expect("MockPaymentProvider: lock poisoned")
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Add or replace a subscription in the "processor".
    pub fn add_subscription(&self, subscription: ProcessorSubscription) {
        self.state()
            .subscriptions
            .insert(subscription.id.clone(), subscription);
    }

    /// Set an error to return on the next call.
    pub fn set_error(&self, error: PaymentError) {
        self.state().next_error = Some(error);
    }

    /// Fail every call until `clear_errors`.
    pub fn fail_always(&self, error: PaymentError) {
        self.state().sticky_error = Some(error);
    }

    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.sticky_error = None;
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Total calls across all methods.
    pub fn total_calls(&self) -> usize {
        self.state().call_log.len()
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<ProcessorSubscription>, PaymentError> {
        let mut state = self.state();
        state.begin_call("get_subscription", subscription_id)?;

        Ok(state.subscriptions.get(subscription_id).cloned())
    }

    async fn cancel_at_period_end(
        &self,
        subscription_id: &str,
    ) -> Result<Option<ProcessorSubscription>, PaymentError> {
        let mut state = self.state();
        state.begin_call("cancel_at_period_end", subscription_id)?;

        Ok(state.subscriptions.get_mut(subscription_id).map(|sub| {
            sub.cancel_at_period_end = true;
            sub.clone()
        }))
    }
}
