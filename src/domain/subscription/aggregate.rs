//! Subscription aggregate.
//!
//! At most one per user. `current_period_end` only ever moves forward:
//! each extension goes through `next_period_end`, so a late or duplicated
//! notification can never shorten or reset the paid period.

use serde::{Deserialize, Serialize};

use crate::domain::access::AccessPolicy;
use crate::domain::foundation::{
    DomainError, ErrorCode, Money, PreapprovalId, StateMachine, Timestamp, UserId,
};

use super::SubscriptionStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub user_id: UserId,
    pub preapproval_id: PreapprovalId,
    pub status: SubscriptionStatus,
    pub current_period_end: Option<Timestamp>,
    pub amount: Money,
    pub cancelled_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Optimistic-lock counter, `0` until first persisted.
    pub version: i64,
}

/// Whether applying a gateway status changed anything worth persisting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Updated,
    Unchanged,
}

impl Subscription {
    pub fn new_pending(
        user_id: UserId,
        preapproval_id: PreapprovalId,
        amount: Money,
        now: Timestamp,
    ) -> Self {
        Self {
            user_id,
            preapproval_id,
            status: SubscriptionStatus::Pending,
            current_period_end: None,
            amount,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Authorized or paused with time left on the period.
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.status.keeps_access()
            && self
                .current_period_end
                .map_or(false, |end| end.is_after(&now))
    }

    /// Starts a new checkout on an existing row. Period end is kept.
    pub fn reactivate(
        &mut self,
        preapproval_id: PreapprovalId,
        amount: Money,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        if self.status != SubscriptionStatus::Pending {
            self.transition_to(SubscriptionStatus::Pending)?;
        }
        self.preapproval_id = preapproval_id;
        self.amount = amount;
        self.cancelled_at = None;
        self.updated_at = now;
        Ok(())
    }

    /// Syncs with the status the gateway reports for the preapproval.
    ///
    /// Re-applying the same status is a no-op, so redelivered preapproval
    /// notifications never extend the period twice. Becoming authorized when
    /// the period has lapsed (or never started) opens a new period.
    pub fn apply_gateway_status(
        &mut self,
        status: SubscriptionStatus,
        policy: &AccessPolicy,
        now: Timestamp,
    ) -> Result<StatusChange, DomainError> {
        match status {
            SubscriptionStatus::Authorized => {
                if self.is_active(now) && self.status == SubscriptionStatus::Authorized {
                    return Ok(StatusChange::Unchanged);
                }
                self.transition_to(SubscriptionStatus::Authorized)?;
                if !self.is_active(now) {
                    self.current_period_end =
                        Some(policy.next_period_end(now, self.current_period_end));
                }
                self.cancelled_at = None;
            }
            SubscriptionStatus::Paused | SubscriptionStatus::Cancelled => {
                if self.status == status {
                    return Ok(StatusChange::Unchanged);
                }
                self.transition_to(status)?;
                if status == SubscriptionStatus::Cancelled {
                    self.cancelled_at = Some(now);
                }
            }
            SubscriptionStatus::Pending => return Ok(StatusChange::Unchanged),
        }
        self.updated_at = now;
        Ok(StatusChange::Updated)
    }

    /// Extends the period for one confirmed recurring charge.
    ///
    /// Callers deduplicate by payment id before invoking this.
    pub fn record_recurring_payment(
        &mut self,
        policy: &AccessPolicy,
        now: Timestamp,
    ) -> Result<Timestamp, DomainError> {
        self.transition_to(SubscriptionStatus::Authorized)?;
        let end = policy.next_period_end(now, self.current_period_end);
        self.current_period_end = Some(end);
        self.cancelled_at = None;
        self.updated_at = now;
        Ok(end)
    }

    fn transition_to(&mut self, target: SubscriptionStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot transition subscription from {} to {}",
                    self.status, target
                ),
            )
            .with_detail("current", self.status.as_str())
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn ts(day: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(2026, 1, day, 12, 0, 0).unwrap())
    }

    fn subscription() -> Subscription {
        Subscription::new_pending(
            UserId::new("u1").unwrap(),
            PreapprovalId::new("pre-1").unwrap(),
            Money::from_cents(990).unwrap(),
            ts(1),
        )
    }

    fn policy() -> AccessPolicy {
        AccessPolicy::default()
    }

    #[test]
    fn pending_is_not_active() {
        assert!(!subscription().is_active(ts(1)));
    }

    #[test]
    fn authorization_opens_first_period() {
        let mut sub = subscription();
        let change = sub
            .apply_gateway_status(SubscriptionStatus::Authorized, &policy(), ts(2))
            .unwrap();

        assert_eq!(change, StatusChange::Updated);
        assert_eq!(sub.status, SubscriptionStatus::Authorized);
        assert_eq!(sub.current_period_end, Some(ts(2).add_days(30)));
        assert!(sub.is_active(ts(3)));
    }

    #[test]
    fn redelivered_authorization_does_not_extend() {
        let mut sub = subscription();
        sub.apply_gateway_status(SubscriptionStatus::Authorized, &policy(), ts(2))
            .unwrap();
        let end = sub.current_period_end;

        let change = sub
            .apply_gateway_status(SubscriptionStatus::Authorized, &policy(), ts(5))
            .unwrap();

        assert_eq!(change, StatusChange::Unchanged);
        assert_eq!(sub.current_period_end, end);
    }

    #[test]
    fn cancellation_sets_timestamp_once() {
        let mut sub = subscription();
        sub.apply_gateway_status(SubscriptionStatus::Authorized, &policy(), ts(2))
            .unwrap();
        sub.apply_gateway_status(SubscriptionStatus::Cancelled, &policy(), ts(3))
            .unwrap();
        let change = sub
            .apply_gateway_status(SubscriptionStatus::Cancelled, &policy(), ts(4))
            .unwrap();

        assert_eq!(change, StatusChange::Unchanged);
        assert_eq!(sub.cancelled_at, Some(ts(3)));
        assert!(!sub.is_active(ts(5)));
    }

    #[test]
    fn paused_keeps_access_until_period_end() {
        let mut sub = subscription();
        sub.apply_gateway_status(SubscriptionStatus::Authorized, &policy(), ts(2))
            .unwrap();
        sub.apply_gateway_status(SubscriptionStatus::Paused, &policy(), ts(3))
            .unwrap();
        assert!(sub.is_active(ts(10)));
    }

    #[test]
    fn resume_after_pause_keeps_period() {
        let mut sub = subscription();
        sub.apply_gateway_status(SubscriptionStatus::Authorized, &policy(), ts(2))
            .unwrap();
        let end = sub.current_period_end;
        sub.apply_gateway_status(SubscriptionStatus::Paused, &policy(), ts(3))
            .unwrap();
        sub.apply_gateway_status(SubscriptionStatus::Authorized, &policy(), ts(4))
            .unwrap();
        assert_eq!(sub.current_period_end, end);
    }

    #[test]
    fn recurring_payment_extends_from_period_end() {
        let mut sub = subscription();
        sub.apply_gateway_status(SubscriptionStatus::Authorized, &policy(), ts(2))
            .unwrap();
        let end = sub.record_recurring_payment(&policy(), ts(3)).unwrap();
        assert_eq!(end, ts(2).add_days(60));
    }

    #[test]
    fn reactivate_clears_cancellation() {
        let mut sub = subscription();
        sub.apply_gateway_status(SubscriptionStatus::Cancelled, &policy(), ts(2))
            .unwrap();
        sub.reactivate(
            PreapprovalId::new("pre-2").unwrap(),
            Money::from_cents(990).unwrap(),
            ts(3),
        )
        .unwrap();

        assert_eq!(sub.status, SubscriptionStatus::Pending);
        assert_eq!(sub.preapproval_id.as_str(), "pre-2");
        assert!(sub.cancelled_at.is_none());
    }

    #[test]
    fn reactivate_authorized_is_rejected() {
        let mut sub = subscription();
        sub.apply_gateway_status(SubscriptionStatus::Authorized, &policy(), ts(2))
            .unwrap();
        let err = sub
            .reactivate(PreapprovalId::new("pre-2").unwrap(), Money::ZERO, ts(3))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }

    proptest! {
        #[test]
        fn period_end_is_monotonic_under_any_payment_order(
            days in proptest::collection::vec(1u32..28, 1..15)
        ) {
            let mut sub = subscription();
            let mut last: Option<Timestamp> = None;
            for day in days {
                sub.record_recurring_payment(&policy(), ts(day)).unwrap();
                let end = sub.current_period_end.unwrap();
                if let Some(prev) = last {
                    prop_assert!(end.is_after(&prev));
                }
                last = Some(end);
            }
        }
    }
}
