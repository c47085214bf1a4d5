//! Scheduled job configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::billing::GracePolicy;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct CronConfig {
    /// Shared secret the scheduler sends in `x-cron-secret`
    #[serde(default)]
    pub secret: Option<SecretString>,

    /// Length of the grace window opened by a failed payment
    #[serde(default = "default_grace_period_days")]
    pub grace_period_days: u32,
}

impl CronConfig {
    /// The cron secret, if set to something non-blank.
    pub fn secret(&self) -> Option<&SecretString> {
        self.secret
            .as_ref()
            .filter(|s| !s.expose_secret().is_empty())
    }

    pub fn grace_policy(&self) -> GracePolicy {
        GracePolicy::from_days(self.grace_period_days)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.grace_period_days == 0 || self.grace_period_days > 90 {
            return Err(ValidationError::InvalidGracePeriod);
        }
        Ok(())
    }
}

impl Default for CronConfig {
    fn default() -> Self {
        Self {
            secret: None,
            grace_period_days: default_grace_period_days(),
        }
    }
}

fn default_grace_period_days() -> u32 {
    GracePolicy::DEFAULT_DAYS
}
