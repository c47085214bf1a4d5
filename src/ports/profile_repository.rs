//! ProfileRepository port - plan columns of user profiles.
//!
//! Profiles are created by sign-up, outside this service. Writes here only
//! touch plan-related columns and never create rows.

use async_trait::async_trait;

use crate::domain::billing::{Plan, PlanUpdate, ProfilePlan};
use crate::domain::foundation::{DomainError, Timestamp, UserId};

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find(&self, user_id: &UserId) -> Result<Option<ProfilePlan>, DomainError>;

    /// Whether the profile carries the admin flag. Missing profiles are not admins.
    async fn is_admin(&self, user_id: &UserId) -> Result<bool, DomainError>;

    /// Applies a plan write. Returns the number of profiles changed (0 or 1).
    ///
    /// Must follow `PlanUpdate::apply_to` semantics for the grace window.
    async fn apply_plan(&self, user_id: &UserId, update: &PlanUpdate) -> Result<u64, DomainError>;

    /// Ids of profiles with `plan = grace` whose non-null `grace_ends_at`
    /// is strictly before `now`.
    async fn find_expired_grace(&self, now: Timestamp) -> Result<Vec<UserId>, DomainError>;

    /// Moves the given profiles from grace to free and clears their grace
    /// window. Profiles no longer in grace are left alone. Returns the
    /// number of profiles changed.
    async fn downgrade_to_free(&self, user_ids: &[UserId], now: Timestamp)
        -> Result<u64, DomainError>;

    /// Current plans of the given users. Users without a profile are omitted.
    async fn plans_for(&self, user_ids: &[UserId]) -> Result<Vec<(UserId, Plan)>, DomainError>;
}
