//! In-memory billing store for tests.
//!
//! One store implements all three store ports over shared state, so a test
//! can hand the same instance to the reconciler, the ingestor and the sweep
//! and then inspect every table. It counts mutations and can be told to fail
//! specific writes.
//!
//! This adapter is for **testing only**. Its inspection helpers use
//! `.expect()` on lock operations and panic if a lock is poisoned.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::billing::{
    Plan, PlanUpdate, ProfilePlan, SubscriptionFilter, SubscriptionRecord, SubscriptionSnapshot,
};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::{
    ProfileRepository, SaveResult, Severity, SubscriptionRepository, WebhookEventRecord,
    WebhookEventRepository,
};

/// Number of successful writes per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationCounts {
    pub subscription_writes: u64,
    pub profile_writes: u64,
    pub webhook_log_writes: u64,
}

impl MutationCounts {
    pub fn total(&self) -> u64 {
        self.subscription_writes + self.profile_writes + self.webhook_log_writes
    }
}

/// Writes the store should reject with a database error.
#[derive(Debug, Clone, Copy, Default)]
struct Faults {
    full_profile_writes: bool,
    all_profile_writes: bool,
    subscription_writes: bool,
    webhook_log_inserts: bool,
}

#[derive(Debug, Default)]
struct StoreState {
    subscriptions: HashMap<String, SubscriptionRecord>,
    profiles: HashMap<UserId, ProfilePlan>,
    webhook_logs: HashMap<String, WebhookEventRecord>,
    mutations: MutationCounts,
    faults: Faults,
}

/// In-memory implementation of the subscription, profile and webhook log
/// ports.
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBillingStore {
    state: Arc<RwLock<StoreState>>,
}

fn injected(what: &str) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("injected failure: {}", what))
}

fn poisoned() -> DomainError {
    DomainError::new(ErrorCode::InternalError, "InMemoryBillingStore: lock poisoned")
}

impl InMemoryBillingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>, DomainError> {
        self.state.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>, DomainError> {
        self.state.write().map_err(|_| poisoned())
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state
            .write()
            .expect("InMemoryBillingStore: state lock poisoned")
    }

    fn state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state
            .read()
            .expect("InMemoryBillingStore: state lock poisoned")
    }

    // === Seeding (not counted as mutations) ===

    pub fn insert_profile(&self, profile: ProfilePlan) {
        self.state_mut()
            .profiles
            .insert(profile.user_id.clone(), profile);
    }

    pub fn insert_subscription(&self, record: SubscriptionRecord) {
        self.state_mut()
            .subscriptions
            .insert(record.snapshot.stripe_subscription_id.clone(), record);
    }

    // === Inspection ===

    pub fn profile(&self, user_id: &UserId) -> Option<ProfilePlan> {
        self.state().profiles.get(user_id).cloned()
    }

    pub fn subscription(&self, stripe_subscription_id: &str) -> Option<SubscriptionRecord> {
        self.state().subscriptions.get(stripe_subscription_id).cloned()
    }

    pub fn subscription_count(&self) -> usize {
        self.state().subscriptions.len()
    }

    pub fn webhook_log(&self, event_id: &str) -> Option<WebhookEventRecord> {
        self.state().webhook_logs.get(event_id).cloned()
    }

    pub fn webhook_log_count(&self) -> usize {
        self.state().webhook_logs.len()
    }

    pub fn mutations(&self) -> MutationCounts {
        self.state().mutations
    }

    // === Fault injection ===

    /// Fails profile writes that carry processor ids; plan-only writes pass.
    pub fn fail_full_profile_writes(&self, fail: bool) {
        self.state_mut().faults.full_profile_writes = fail;
    }

    /// Fails every profile write.
    pub fn fail_profile_writes(&self, fail: bool) {
        self.state_mut().faults.all_profile_writes = fail;
    }

    pub fn fail_subscription_writes(&self, fail: bool) {
        self.state_mut().faults.subscription_writes = fail;
    }

    pub fn fail_webhook_log_inserts(&self, fail: bool) {
        self.state_mut().faults.webhook_log_inserts = fail;
    }
}

#[async_trait]
impl SubscriptionRepository for InMemoryBillingStore {
    async fn upsert(&self, snapshot: &SubscriptionSnapshot) -> Result<(), DomainError> {
        let mut state = self.write()?;
        if state.faults.subscription_writes {
            return Err(injected("subscription upsert"));
        }

        let key = snapshot.stripe_subscription_id.clone();
        match state.subscriptions.get_mut(&key) {
            Some(existing) => {
                let owner = existing.snapshot.user_id.clone();
                existing.snapshot = SubscriptionSnapshot {
                    user_id: owner,
                    ..snapshot.clone()
                };
            }
            None => {
                state.subscriptions.insert(
                    key,
                    SubscriptionRecord {
                        snapshot: snapshot.clone(),
                        past_due_seen_at: None,
                    },
                );
            }
        }
        state.mutations.subscription_writes += 1;
        Ok(())
    }

    async fn find_user_id(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<UserId>, DomainError> {
        Ok(self
            .read()?
            .subscriptions
            .get(stripe_subscription_id)
            .map(|record| record.snapshot.user_id.clone()))
    }

    async fn find(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        Ok(self.read()?.subscriptions.get(stripe_subscription_id).cloned())
    }

    async fn mark_past_due_seen(
        &self,
        stripe_subscription_id: &str,
        at: Timestamp,
    ) -> Result<(), DomainError> {
        let mut state = self.write()?;
        if state.faults.subscription_writes {
            return Err(injected("past_due_seen_at stamp"));
        }
        if let Some(record) = state.subscriptions.get_mut(stripe_subscription_id) {
            record.past_due_seen_at = Some(at);
            state.mutations.subscription_writes += 1;
        }
        Ok(())
    }

    async fn list(
        &self,
        filter: &SubscriptionFilter,
    ) -> Result<Vec<SubscriptionSnapshot>, DomainError> {
        let state = self.read()?;
        let mut rows: Vec<SubscriptionSnapshot> = state
            .subscriptions
            .values()
            .map(|record| &record.snapshot)
            .filter(|snapshot| filter.matches(snapshot))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        rows.truncate(filter.effective_limit() as usize);
        Ok(rows)
    }
}

#[async_trait]
impl ProfileRepository for InMemoryBillingStore {
    async fn find(&self, user_id: &UserId) -> Result<Option<ProfilePlan>, DomainError> {
        Ok(self.read()?.profiles.get(user_id).cloned())
    }

    async fn is_admin(&self, user_id: &UserId) -> Result<bool, DomainError> {
        Ok(self
            .read()?
            .profiles
            .get(user_id)
            .map_or(false, |p| p.is_admin))
    }

    async fn apply_plan(&self, user_id: &UserId, update: &PlanUpdate) -> Result<u64, DomainError> {
        let mut state = self.write()?;
        if state.faults.all_profile_writes {
            return Err(injected("profile write"));
        }
        if state.faults.full_profile_writes && update.billing_ids.is_some() {
            return Err(injected("full profile write"));
        }

        let Some(profile) = state.profiles.get_mut(user_id) else {
            return Ok(0);
        };
        update.apply_to(profile);
        state.mutations.profile_writes += 1;
        Ok(1)
    }

    async fn find_expired_grace(&self, now: Timestamp) -> Result<Vec<UserId>, DomainError> {
        Ok(self
            .read()?
            .profiles
            .values()
            .filter(|p| p.grace_expired(&now))
            .map(|p| p.user_id.clone())
            .collect())
    }

    async fn downgrade_to_free(
        &self,
        user_ids: &[UserId],
        now: Timestamp,
    ) -> Result<u64, DomainError> {
        let mut state = self.write()?;
        if state.faults.all_profile_writes {
            return Err(injected("grace downgrade"));
        }

        let mut changed = 0;
        for user_id in user_ids {
            if let Some(profile) = state.profiles.get_mut(user_id) {
                if profile.plan == Plan::Grace {
                    profile.expire_grace(now);
                    changed += 1;
                }
            }
        }
        state.mutations.profile_writes += changed;
        Ok(changed)
    }

    async fn plans_for(&self, user_ids: &[UserId]) -> Result<Vec<(UserId, Plan)>, DomainError> {
        let state = self.read()?;
        Ok(user_ids
            .iter()
            .filter_map(|id| state.profiles.get(id).map(|p| (id.clone(), p.plan)))
            .collect())
    }
}

#[async_trait]
impl WebhookEventRepository for InMemoryBillingStore {
    async fn insert_if_absent(
        &self,
        record: &WebhookEventRecord,
    ) -> Result<SaveResult, DomainError> {
        let mut state = self.write()?;
        if state.faults.webhook_log_inserts {
            return Err(injected("webhook log insert"));
        }
        if state.webhook_logs.contains_key(&record.event_id) {
            return Ok(SaveResult::AlreadyExists);
        }
        state
            .webhook_logs
            .insert(record.event_id.clone(), record.clone());
        state.mutations.webhook_log_writes += 1;
        Ok(SaveResult::Inserted)
    }

    async fn record_outcome(
        &self,
        event_id: &str,
        severity: Severity,
        message: &str,
    ) -> Result<(), DomainError> {
        let mut state = self.write()?;
        if let Some(record) = state.webhook_logs.get_mut(event_id) {
            record.severity = severity;
            record.message = message.to_string();
            state.mutations.webhook_log_writes += 1;
        }
        Ok(())
    }

    async fn list_recent(
        &self,
        min_severity: Severity,
        limit: u32,
    ) -> Result<Vec<WebhookEventRecord>, DomainError> {
        let state = self.read()?;
        let mut rows: Vec<WebhookEventRecord> = state
            .webhook_logs
            .values()
            .filter(|r| r.severity >= min_severity)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::{BillingIds, GracePolicy, SubscriptionStatus};

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn snapshot(owner: &str, status: &str, at: Timestamp) -> SubscriptionSnapshot {
        SubscriptionSnapshot {
            user_id: user(owner),
            stripe_customer_id: Some("cus_1".to_string()),
            stripe_subscription_id: "sub_123".to_string(),
            status: Some(SubscriptionStatus::new(status)),
            price_id: None,
            current_period_end: None,
            cancel_at_period_end: false,
            updated_at: at,
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Subscription Mirror Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn upsert_overwrites_fields_but_keeps_owner() {
        let store = InMemoryBillingStore::new();
        store.upsert(&snapshot("user_1", "active", Timestamp::now())).await.unwrap();
        store.upsert(&snapshot("user_2", "canceled", Timestamp::now())).await.unwrap();

        let record = store.subscription("sub_123").unwrap();
        assert_eq!(store.subscription_count(), 1);
        assert_eq!(record.snapshot.user_id, user("user_1"));
        assert_eq!(record.snapshot.status.unwrap().as_str(), "canceled");
    }

    #[tokio::test]
    async fn upsert_preserves_past_due_stamp() {
        let store = InMemoryBillingStore::new();
        let at = Timestamp::now();
        store.upsert(&snapshot("user_1", "active", at)).await.unwrap();
        store.mark_past_due_seen("sub_123", at).await.unwrap();
        store.upsert(&snapshot("user_1", "past_due", at)).await.unwrap();

        assert_eq!(store.subscription("sub_123").unwrap().past_due_seen_at, Some(at));
    }

    #[tokio::test]
    async fn mark_past_due_seen_ignores_unknown_subscription() {
        let store = InMemoryBillingStore::new();
        store.mark_past_due_seen("sub_missing", Timestamp::now()).await.unwrap();
        assert_eq!(store.mutations().total(), 0);
    }

    // ══════════════════════════════════════════════════════════════
    // Profile Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn apply_plan_on_missing_profile_changes_nothing() {
        let store = InMemoryBillingStore::new();
        let update = PlanUpdate::new(
            Plan::Pro,
            BillingIds {
                stripe_customer_id: None,
                stripe_subscription_id: "sub_1".to_string(),
            },
            &GracePolicy::default(),
            Timestamp::now(),
        );

        let changed = store.apply_plan(&user("ghost"), &update).await.unwrap();

        assert_eq!(changed, 0);
        assert_eq!(store.mutations().profile_writes, 0);
    }

    #[tokio::test]
    async fn full_write_fault_lets_plan_only_through() {
        let store = InMemoryBillingStore::new();
        store.insert_profile(ProfilePlan::new(user("user_1")));
        store.fail_full_profile_writes(true);
        let update = PlanUpdate::new(
            Plan::Pro,
            BillingIds {
                stripe_customer_id: None,
                stripe_subscription_id: "sub_1".to_string(),
            },
            &GracePolicy::default(),
            Timestamp::now(),
        );

        assert!(store.apply_plan(&user("user_1"), &update).await.is_err());
        assert_eq!(store.apply_plan(&user("user_1"), &update.plan_only()).await.unwrap(), 1);
        assert_eq!(store.profile(&user("user_1")).unwrap().plan, Plan::Pro);
    }

    #[tokio::test]
    async fn downgrade_skips_profiles_no_longer_in_grace() {
        let store = InMemoryBillingStore::new();
        let mut pro = ProfilePlan::new(user("user_pro"));
        pro.plan = Plan::Pro;
        store.insert_profile(pro);

        let changed = store
            .downgrade_to_free(&[user("user_pro")], Timestamp::now())
            .await
            .unwrap();

        assert_eq!(changed, 0);
        assert_eq!(store.profile(&user("user_pro")).unwrap().plan, Plan::Pro);
    }

    // ══════════════════════════════════════════════════════════════
    // Webhook Log Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn insert_if_absent_detects_duplicates() {
        let store = InMemoryBillingStore::new();
        let record = WebhookEventRecord::received("evt_1", "ping", None);

        assert_eq!(store.insert_if_absent(&record).await.unwrap(), SaveResult::Inserted);
        assert_eq!(
            store.insert_if_absent(&record).await.unwrap(),
            SaveResult::AlreadyExists
        );
        assert_eq!(store.webhook_log_count(), 1);
    }

    #[tokio::test]
    async fn list_recent_filters_by_severity() {
        let store = InMemoryBillingStore::new();
        store
            .insert_if_absent(&WebhookEventRecord::received("evt_ok", "ping", None))
            .await
            .unwrap();
        store
            .insert_if_absent(&WebhookEventRecord::received("evt_bad", "ping", None))
            .await
            .unwrap();
        store
            .record_outcome("evt_bad", Severity::Error, "Handler failure")
            .await
            .unwrap();

        let rows = store.list_recent(Severity::Warn, 50).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].event_id, "evt_bad");
    }
}
