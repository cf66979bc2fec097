//! Access status state machine.
//!
//! "No access" is the absence of a row, so it has no variant here.
//!
//! ```text
//!   Trial ──► Pending ──► Approved
//!     ▲          │            ▲
//!     └──────────┘            │
//!     └───────────────────────┘
//! ```
//!
//! `Approved` is terminal for every path except administrative override,
//! which bypasses the state machine.

use crate::domain::foundation::{StateMachine, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessStatus {
    /// Checkout started, payment not yet confirmed.
    Pending,
    /// Free time-boxed access.
    Trial,
    /// Paid and confirmed by the settlement processor.
    Approved,
}

impl AccessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessStatus::Pending => "pending",
            AccessStatus::Trial => "trial",
            AccessStatus::Approved => "approved",
        }
    }
}

impl fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AccessStatus::Pending),
            "trial" => Ok(AccessStatus::Trial),
            "approved" => Ok(AccessStatus::Approved),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown access status '{}'", other),
            )),
        }
    }
}

impl StateMachine for AccessStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use AccessStatus::*;
        matches!(
            (self, target),
            (Trial, Pending) | (Trial, Approved) | (Pending, Trial) | (Pending, Approved)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use AccessStatus::*;
        match self {
            Trial => vec![Pending, Approved],
            Pending => vec![Trial, Approved],
            Approved => vec![],
        }
    }
}
