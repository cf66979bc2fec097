//! Access window, trial and session limits

use serde::Deserialize;

use crate::domain::access::{AccessPolicy, SUBSCRIPTION_PERIOD_DAYS, TRIAL_DURATION_HOURS};
use crate::domain::foundation::Timestamp;
use crate::domain::session::{MAX_SESSIONS, STALE_AFTER_MINUTES};

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    #[serde(default = "default_trial_hours")]
    pub trial_hours: i64,

    /// Module cutoff as RFC 3339. Only VIP users keep access after it.
    #[serde(default = "default_module_end_date")]
    pub module_end_date: String,

    #[serde(default = "default_subscription_period_days")]
    pub subscription_period_days: i64,

    /// Concurrent sessions per user
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Sessions without a heartbeat for this long are reaped
    #[serde(default = "default_session_stale_minutes")]
    pub session_stale_minutes: i64,
}

impl AccessConfig {
    pub fn policy(&self) -> Result<AccessPolicy, ValidationError> {
        let module_end_date = Timestamp::parse_rfc3339(&self.module_end_date)
            .ok_or(ValidationError::InvalidModuleEndDate)?;
        Ok(AccessPolicy {
            trial_hours: self.trial_hours,
            module_end_date,
            subscription_period_days: self.subscription_period_days,
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.policy()?;
        if self.trial_hours <= 0 {
            return Err(ValidationError::NotPositive("access.trial_hours"));
        }
        if self.subscription_period_days <= 0 {
            return Err(ValidationError::NotPositive("access.subscription_period_days"));
        }
        if self.max_sessions == 0 {
            return Err(ValidationError::NotPositive("access.max_sessions"));
        }
        if self.session_stale_minutes <= 0 {
            return Err(ValidationError::NotPositive("access.session_stale_minutes"));
        }
        Ok(())
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            trial_hours: default_trial_hours(),
            module_end_date: default_module_end_date(),
            subscription_period_days: default_subscription_period_days(),
            max_sessions: default_max_sessions(),
            session_stale_minutes: default_session_stale_minutes(),
        }
    }
}

fn default_trial_hours() -> i64 {
    TRIAL_DURATION_HOURS
}

fn default_module_end_date() -> String {
    "2026-05-08T23:59:59-03:00".to_string()
}

fn default_subscription_period_days() -> i64 {
    SUBSCRIPTION_PERIOD_DAYS
}

fn default_max_sessions() -> usize {
    MAX_SESSIONS
}

fn default_session_stale_minutes() -> i64 {
    STALE_AFTER_MINUTES
}
