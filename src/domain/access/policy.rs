//! Trial and subscription policy.
//!
//! Pure functions, no I/O. `AccessPolicy` carries the configured values and
//! delegates to the free functions so either form can be tested directly.

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SubjectId, Timestamp, UserId};

/// Default length of the one-time free trial.
pub const TRIAL_DURATION_HOURS: i64 = 72;

/// Period added on each confirmed recurring payment.
pub const SUBSCRIPTION_PERIOD_DAYS: i64 = 30;

/// Record that a user consumed their lifetime trial.
///
/// Kept separately from access entries so that cancelling, upgrading or
/// deleting an entry can never make a user eligible again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialGrant {
    pub user_id: UserId,
    pub subject_id: SubjectId,
    pub granted_at: Timestamp,
    pub expires_at: Timestamp,
}

/// False as soon as any trial was ever granted, for any subject, expired or not.
pub fn is_trial_eligible(existing_trials: &[TrialGrant]) -> bool {
    existing_trials.is_empty()
}

/// End of a trial started at `activated_at`.
pub fn trial_expiry(activated_at: Timestamp, trial_hours: i64) -> Timestamp {
    activated_at.add_hours(trial_hours)
}

/// Hard cutoff for the module. VIP users bypass it; nobody else does,
/// not even approved buyers.
pub fn is_access_window_open(now: Timestamp, module_end_date: Timestamp, is_vip: bool) -> bool {
    is_vip || !now.is_after(&module_end_date)
}

/// `max(now, previous_end) + period_days`. Never moves backwards.
pub fn next_period_end(
    now: Timestamp,
    previous_end: Option<Timestamp>,
    period_days: i64,
) -> Timestamp {
    previous_end
        .map_or(now, |prev| prev.max(now))
        .add_days(period_days)
}

/// Default module end: 2026-05-08 23:59:59 at UTC-3.
pub fn default_module_end_date() -> Timestamp {
    Timestamp::from_datetime(
        Utc.with_ymd_and_hms(2026, 5, 9, 2, 59, 59)
            .single()
            .unwrap_or_else(Utc::now),
    )
}

/// Configured policy values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPolicy {
    pub trial_hours: i64,
    pub module_end_date: Timestamp,
    pub subscription_period_days: i64,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            trial_hours: TRIAL_DURATION_HOURS,
            module_end_date: default_module_end_date(),
            subscription_period_days: SUBSCRIPTION_PERIOD_DAYS,
        }
    }
}

impl AccessPolicy {
    pub fn trial_expiry(&self, activated_at: Timestamp) -> Timestamp {
        trial_expiry(activated_at, self.trial_hours)
    }

    pub fn is_access_window_open(&self, now: Timestamp, is_vip: bool) -> bool {
        is_access_window_open(now, self.module_end_date, is_vip)
    }

    pub fn next_period_end(&self, now: Timestamp, previous_end: Option<Timestamp>) -> Timestamp {
        next_period_end(now, previous_end, self.subscription_period_days)
    }
}
