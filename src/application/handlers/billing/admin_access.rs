//! Shared gate for the admin operations.
//!
//! Order matters: the caller's admin flag is checked before the request body
//! is looked at and before any processor call.

use crate::domain::billing::BillingError;
use crate::domain::foundation::{AuthenticatedUser, UserId};
use crate::ports::ProfileRepository;

/// Fails with `Forbidden` unless the caller's profile has `is_admin`.
///
/// A failed lookup counts as "not an admin".
pub async fn require_admin(
    profiles: &dyn ProfileRepository,
    caller: &AuthenticatedUser,
) -> Result<(), BillingError> {
    match profiles.is_admin(&caller.id).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            tracing::warn!(user_id = %caller.id, "Admin access denied");
            Err(BillingError::Forbidden)
        }
        Err(e) => {
            tracing::warn!(user_id = %caller.id, error = %e, "Admin lookup failed");
            Err(BillingError::Forbidden)
        }
    }
}

/// The `{subscriptionId, userId}` pair both admin commands take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminTarget {
    pub subscription_id: String,
    pub user_id: UserId,
}

impl AdminTarget {
    /// Both fields must be present and non-blank.
    pub fn parse(
        subscription_id: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<Self, BillingError> {
        let missing = || {
            BillingError::invalid_input(
                "subscriptionId,userId",
                "subscriptionId and userId are required.",
            )
        };

        let subscription_id = subscription_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(missing)?;
        let user_id = user_id
            .map(UserId::new)
            .and_then(Result::ok)
            .ok_or_else(missing)?;

        Ok(Self {
            subscription_id: subscription_id.to_string(),
            user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryBillingStore;
    use crate::domain::billing::ProfilePlan;

    fn caller(id: &str) -> AuthenticatedUser {
        AuthenticatedUser::new(UserId::new(id).unwrap(), None)
    }

    #[tokio::test]
    async fn admin_flag_grants_access() {
        let store = InMemoryBillingStore::new();
        let mut admin = ProfilePlan::new(UserId::new("admin").unwrap());
        admin.is_admin = true;
        store.insert_profile(admin);

        assert!(require_admin(&store, &caller("admin")).await.is_ok());
    }

    #[tokio::test]
    async fn non_admin_and_unknown_users_are_forbidden() {
        let store = InMemoryBillingStore::new();
        store.insert_profile(ProfilePlan::new(UserId::new("user_1").unwrap()));

        assert_eq!(
            require_admin(&store, &caller("user_1")).await,
            Err(BillingError::Forbidden)
        );
        assert_eq!(
            require_admin(&store, &caller("ghost")).await,
            Err(BillingError::Forbidden)
        );
    }

    #[test]
    fn target_requires_both_fields() {
        assert!(AdminTarget::parse(Some("sub_1"), None).is_err());
        assert!(AdminTarget::parse(None, Some("user_1")).is_err());
        assert!(AdminTarget::parse(Some("  "), Some("user_1")).is_err());
        assert!(AdminTarget::parse(Some("sub_1"), Some("")).is_err());
    }

    #[test]
    fn target_trims_subscription_id() {
        let target = AdminTarget::parse(Some(" sub_1 "), Some("user_1")).unwrap();
        assert_eq!(target.subscription_id, "sub_1");
        assert_eq!(target.user_id.as_str(), "user_1");
    }
}
