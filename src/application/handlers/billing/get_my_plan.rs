//! GetMyPlanHandler - the caller's own plan projection.

use std::sync::Arc;

use crate::domain::billing::{BillingError, ProfilePlan};
use crate::domain::foundation::UserId;
use crate::ports::ProfileRepository;

#[derive(Debug, Clone)]
pub struct GetMyPlanQuery {
    pub user_id: UserId,
    /// The client gave up waiting on an earlier plan poll (`?log=timeout`).
    pub client_timed_out: bool,
}

pub type GetMyPlanResult = ProfilePlan;

/// Returns the plan stored on the caller's profile. The profile is the
/// source of truth; the processor is never consulted here.
pub struct GetMyPlanHandler {
    profiles: Arc<dyn ProfileRepository>,
}

impl GetMyPlanHandler {
    pub fn new(profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { profiles }
    }

    pub async fn handle(&self, query: GetMyPlanQuery) -> Result<GetMyPlanResult, BillingError> {
        if query.client_timed_out {
            tracing::warn!(user_id = %query.user_id, "Client plan sync timed out");
        }

        match self.profiles.find(&query.user_id).await {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => Err(BillingError::NotFound("Plan not found.".to_string())),
            Err(e) => {
                tracing::warn!(user_id = %query.user_id, error = %e, "Plan read failed");
                Err(BillingError::NotFound("Plan not found.".to_string()))
            }
        }
    }
}
