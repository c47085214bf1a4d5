//! Plan tiers and the status-to-plan derivation.
//!
//! `plan_for_status` is the only place a processor subscription status is
//! turned into a plan. The webhook path, the admin check, the admin resync
//! and the admin listing all call it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// User-facing entitlement tier stored on the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Pro,
    Grace,
}

impl Plan {
    /// Returns the stored representation of the plan.
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Pro => "pro",
            Plan::Grace => "grace",
        }
    }

    /// Reads a plan column leniently: anything unrecognized is `free`.
    pub fn from_stored(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    /// Returns true if this plan is the time-boxed grace tier.
    pub fn is_grace(&self) -> bool {
        matches!(self, Plan::Grace)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Plan::Free),
            "pro" => Ok(Plan::Pro),
            "grace" => Ok(Plan::Grace),
            other => Err(ValidationError::invalid_format(
                "plan",
                format!("unknown tier '{}'", other),
            )),
        }
    }
}

/// Derives the plan a subscription status entitles its owner to.
///
/// ```text
/// active, trialing         -> pro
/// past_due, unpaid         -> grace
/// anything else, or none   -> free
/// ```
pub fn plan_for_status(status: Option<&str>) -> Plan {
    match status {
        Some("active") | Some("trialing") => Plan::Pro,
        Some("past_due") | Some("unpaid") => Plan::Grace,
        _ => Plan::Free,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn paying_statuses_map_to_pro() {
        assert_eq!(plan_for_status(Some("active")), Plan::Pro);
        assert_eq!(plan_for_status(Some("trialing")), Plan::Pro);
    }

    #[test]
    fn delinquent_statuses_map_to_grace() {
        assert_eq!(plan_for_status(Some("past_due")), Plan::Grace);
        assert_eq!(plan_for_status(Some("unpaid")), Plan::Grace);
    }

    #[test]
    fn terminal_and_pending_statuses_map_to_free() {
        for status in ["canceled", "incomplete", "incomplete_expired", "paused"] {
            assert_eq!(plan_for_status(Some(status)), Plan::Free, "status {}", status);
        }
    }

    #[test]
    fn absent_status_maps_to_free() {
        assert_eq!(plan_for_status(None), Plan::Free);
    }

    #[test]
    fn mapping_is_case_sensitive() {
        assert_eq!(plan_for_status(Some("ACTIVE")), Plan::Free);
        assert_eq!(plan_for_status(Some("")), Plan::Free);
    }

    #[test]
    fn plan_parses_and_displays() {
        assert_eq!("grace".parse::<Plan>().unwrap(), Plan::Grace);
        assert_eq!(Plan::Pro.to_string(), "pro");
        assert!("gold".parse::<Plan>().is_err());
    }

    #[test]
    fn from_stored_defaults_to_free() {
        assert_eq!(Plan::from_stored(Some("pro")), Plan::Pro);
        assert_eq!(Plan::from_stored(Some("enterprise")), Plan::Free);
        assert_eq!(Plan::from_stored(None), Plan::Free);
    }

    #[test]
    fn plan_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Plan::Grace).unwrap(), "\"grace\"");
    }

    proptest! {
        #[test]
        fn unrecognized_statuses_never_grant_access(status in "[a-z_]{1,24}") {
            prop_assume!(!["active", "trialing", "past_due", "unpaid"].contains(&status.as_str()));
            prop_assert_eq!(plan_for_status(Some(&status)), Plan::Free);
        }
    }
}
