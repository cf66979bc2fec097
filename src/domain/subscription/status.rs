//! Subscription status state machine.

use crate::domain::foundation::{StateMachine, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Preapproval created, payer has not authorized yet.
    Pending,
    /// Recurring charge authorized by the payer.
    Authorized,
    /// Charges suspended; access lasts until `current_period_end`.
    Paused,
    /// Ended. Rows are never deleted, only moved here.
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Authorized => "authorized",
            SubscriptionStatus::Paused => "paused",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }

    /// Statuses under which an unexpired period still grants access.
    pub fn keeps_access(&self) -> bool {
        matches!(self, SubscriptionStatus::Authorized | SubscriptionStatus::Paused)
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubscriptionStatus::Pending),
            "authorized" => Ok(SubscriptionStatus::Authorized),
            "paused" => Ok(SubscriptionStatus::Paused),
            "cancelled" => Ok(SubscriptionStatus::Cancelled),
            other => Err(ValidationError::invalid_format(
                "subscription_status",
                format!("unknown subscription status '{}'", other),
            )),
        }
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            (Pending, Authorized)
                | (Pending, Paused)
                | (Pending, Cancelled)
                | (Authorized, Authorized)
                | (Authorized, Paused)
                | (Authorized, Cancelled)
                | (Paused, Authorized)
                | (Paused, Cancelled)
                | (Paused, Pending)
                | (Cancelled, Pending)
                | (Cancelled, Authorized)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Pending => vec![Authorized, Paused, Cancelled],
            Authorized => vec![Authorized, Paused, Cancelled],
            Paused => vec![Authorized, Cancelled, Pending],
            Cancelled => vec![Pending, Authorized],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SubscriptionStatus; 4] = [
        SubscriptionStatus::Pending,
        SubscriptionStatus::Authorized,
        SubscriptionStatus::Paused,
        SubscriptionStatus::Cancelled,
    ];

    #[test]
    fn authorized_can_renew_itself() {
        assert!(SubscriptionStatus::Authorized.can_transition_to(&SubscriptionStatus::Authorized));
    }

    #[test]
    fn cancelled_can_be_reactivated() {
        assert!(SubscriptionStatus::Cancelled.can_transition_to(&SubscriptionStatus::Pending));
    }

    #[test]
    fn authorized_cannot_fall_back_to_pending() {
        assert!(!SubscriptionStatus::Authorized.can_transition_to(&SubscriptionStatus::Pending));
    }

    #[test]
    fn no_status_is_terminal() {
        for status in ALL {
            assert!(!status.is_terminal());
        }
    }

    #[test]
    fn can_transition_to_matches_valid_transitions() {
        for from in ALL {
            for to in ALL {
                assert_eq!(from.can_transition_to(&to), from.valid_transitions().contains(&to));
            }
        }
    }

    #[test]
    fn only_authorized_and_paused_keep_access() {
        assert!(SubscriptionStatus::Authorized.keeps_access());
        assert!(SubscriptionStatus::Paused.keeps_access());
        assert!(!SubscriptionStatus::Pending.keeps_access());
        assert!(!SubscriptionStatus::Cancelled.keeps_access());
    }

    #[test]
    fn parses_known_statuses() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<SubscriptionStatus>().unwrap(), status);
        }
    }
}
