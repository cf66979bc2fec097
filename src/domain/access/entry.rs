//! AccessEntry aggregate.
//!
//! One row per (user, subject). `version` is the optimistic-lock counter:
//! `0` means the entry was never persisted, and every successful write stores
//! `version + 1`.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    GroupNumber, Money, StateMachine, SubjectId, Timestamp, UserId,
};

use super::{AccessError, AccessStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEntry {
    pub user_id: UserId,
    pub subject_id: SubjectId,
    pub group: GroupNumber,
    pub status: AccessStatus,
    /// Survives a trial -> pending move so a cancelled checkout can fall back.
    pub trial_expires_at: Option<Timestamp>,
    /// Preference id while pending, gateway payment id once approved.
    pub payment_reference: Option<String>,
    pub amount_paid: Option<Money>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub version: i64,
}

/// Outcome of `confirm_approved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Approved,
    AlreadyApproved,
}

/// What `cancel_pending` asks the repository to do with the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelDisposition {
    /// Trial window still open: status reverts to trial.
    RevertToTrial,
    /// No usable trial window: the row must be deleted.
    Delete,
    /// Entry was not pending; nothing to do.
    NotPending,
}

impl AccessEntry {
    /// A fresh trial entry.
    pub fn new_trial(
        user_id: UserId,
        subject_id: SubjectId,
        group: GroupNumber,
        expires_at: Timestamp,
        now: Timestamp,
    ) -> Self {
        Self {
            user_id,
            subject_id,
            group,
            status: AccessStatus::Trial,
            trial_expires_at: Some(expires_at),
            payment_reference: None,
            amount_paid: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// A fresh pending entry for a checkout with no prior row.
    pub fn new_pending(
        user_id: UserId,
        subject_id: SubjectId,
        group: GroupNumber,
        payment_reference: Option<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            user_id,
            subject_id,
            group,
            status: AccessStatus::Pending,
            trial_expires_at: None,
            payment_reference,
            amount_paid: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.version > 0
    }

    pub fn is_approved(&self) -> bool {
        self.status == AccessStatus::Approved
    }

    /// True if a trial window exists and has not yet passed.
    pub fn has_unexpired_trial_window(&self, now: Timestamp) -> bool {
        self.trial_expires_at
            .map_or(false, |expires| expires.is_after(&now))
    }

    pub fn has_active_trial(&self, now: Timestamp) -> bool {
        self.status == AccessStatus::Trial && self.has_unexpired_trial_window(now)
    }

    /// Approved, or trial still running. The module window is checked separately.
    pub fn grants_access(&self, now: Timestamp) -> bool {
        self.is_approved() || self.has_active_trial(now)
    }

    /// Moves to pending for a (possibly retried) checkout.
    ///
    /// Keeps the current group unless `group` is given. Re-marking a pending
    /// entry only refreshes the reference.
    pub fn mark_pending(
        &mut self,
        group: Option<GroupNumber>,
        payment_reference: Option<String>,
        now: Timestamp,
    ) -> Result<(), AccessError> {
        if self.status != AccessStatus::Pending {
            self.transition_to(AccessStatus::Pending, "mark pending")?;
        }
        if let Some(group) = group {
            self.group = group;
        }
        if payment_reference.is_some() {
            self.payment_reference = payment_reference;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Records a confirmed payment. Re-confirming is a no-op.
    pub fn confirm_approved(
        &mut self,
        group: GroupNumber,
        payment_reference: impl Into<String>,
        amount_paid: Money,
        now: Timestamp,
    ) -> Result<ConfirmOutcome, AccessError> {
        if self.is_approved() {
            return Ok(ConfirmOutcome::AlreadyApproved);
        }
        self.transition_to(AccessStatus::Approved, "approve")?;
        self.group = group;
        self.payment_reference = Some(payment_reference.into());
        self.amount_paid = Some(amount_paid);
        self.updated_at = now;
        Ok(ConfirmOutcome::Approved)
    }

    /// Decides what cancelling a pending checkout does to this entry and
    /// applies the in-memory part of it.
    pub fn cancel_pending(&mut self, now: Timestamp) -> Result<CancelDisposition, AccessError> {
        if self.status != AccessStatus::Pending {
            return Ok(CancelDisposition::NotPending);
        }
        if self.has_unexpired_trial_window(now) {
            self.transition_to(AccessStatus::Trial, "cancel pending")?;
            self.payment_reference = None;
            self.updated_at = now;
            Ok(CancelDisposition::RevertToTrial)
        } else {
            Ok(CancelDisposition::Delete)
        }
    }

    /// Converts an abandoned pending checkout into the user's trial.
    pub fn start_trial(
        &mut self,
        group: GroupNumber,
        expires_at: Timestamp,
        now: Timestamp,
    ) -> Result<(), AccessError> {
        self.transition_to(AccessStatus::Trial, "start trial")?;
        self.group = group;
        self.trial_expires_at = Some(expires_at);
        self.payment_reference = None;
        self.updated_at = now;
        Ok(())
    }

    /// Support override. Skips every business rule.
    pub fn admin_override(&mut self, status: AccessStatus, group: GroupNumber, now: Timestamp) {
        self.status = status;
        self.group = group;
        self.updated_at = now;
    }

    fn transition_to(&mut self, target: AccessStatus, action: &str) -> Result<(), AccessError> {
        self.status = self
            .status
            .transition_to(target)
            .map_err(|_| AccessError::invalid_state(self.status.as_str(), action))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ts(day: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap())
    }

    fn group(n: i32) -> GroupNumber {
        GroupNumber::new(n).unwrap()
    }

    fn trial_entry() -> AccessEntry {
        AccessEntry::new_trial(
            UserId::new("u1").unwrap(),
            SubjectId::new("ped").unwrap(),
            group(3),
            ts(4),
            ts(1),
        )
    }

    fn pending_entry() -> AccessEntry {
        AccessEntry::new_pending(
            UserId::new("u1").unwrap(),
            SubjectId::new("cm").unwrap(),
            group(5),
            Some("pref-1".to_string()),
            ts(1),
        )
    }

    fn amount(cents: i64) -> Money {
        Money::from_cents(cents).unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════
    // Construction
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn new_entries_are_unpersisted() {
        assert!(!trial_entry().is_persisted());
        assert_eq!(trial_entry().version, 0);
    }

    #[test]
    fn trial_grants_access_until_expiry() {
        let entry = trial_entry();
        assert!(entry.grants_access(ts(2)));
        assert!(!entry.grants_access(ts(5)));
    }

    #[test]
    fn pending_never_grants_access() {
        assert!(!pending_entry().grants_access(ts(1)));
    }

    // ════════════════════════════════════════════════════════════════════════
    // mark_pending
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn mark_pending_from_trial_keeps_window() {
        let mut entry = trial_entry();
        entry.mark_pending(None, Some("pref-9".into()), ts(2)).unwrap();

        assert_eq!(entry.status, AccessStatus::Pending);
        assert_eq!(entry.trial_expires_at, Some(ts(4)));
        assert_eq!(entry.group, group(3));
        assert_eq!(entry.payment_reference.as_deref(), Some("pref-9"));
    }

    #[test]
    fn mark_pending_is_idempotent_and_can_change_group() {
        let mut entry = pending_entry();
        entry.mark_pending(Some(group(7)), None, ts(2)).unwrap();
        entry.mark_pending(None, None, ts(3)).unwrap();

        assert_eq!(entry.status, AccessStatus::Pending);
        assert_eq!(entry.group, group(7));
        assert_eq!(entry.payment_reference.as_deref(), Some("pref-1"));
    }

    #[test]
    fn mark_pending_on_approved_fails() {
        let mut entry = pending_entry();
        entry.confirm_approved(group(5), "P1", amount(1690), ts(2)).unwrap();
        let err = entry.mark_pending(None, None, ts(3)).unwrap_err();
        assert!(matches!(err, AccessError::InvalidState { .. }));
    }

    // ════════════════════════════════════════════════════════════════════════
    // confirm_approved
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn confirm_records_payment() {
        let mut entry = pending_entry();
        let outcome = entry.confirm_approved(group(5), "P1", amount(1690), ts(2)).unwrap();

        assert_eq!(outcome, ConfirmOutcome::Approved);
        assert_eq!(entry.status, AccessStatus::Approved);
        assert_eq!(entry.payment_reference.as_deref(), Some("P1"));
        assert_eq!(entry.amount_paid, Some(amount(1690)));
    }

    #[test]
    fn confirm_twice_is_noop() {
        let mut entry = pending_entry();
        entry.confirm_approved(group(5), "P1", amount(1690), ts(2)).unwrap();
        let snapshot = entry.clone();

        let outcome = entry.confirm_approved(group(9), "P2", amount(9999), ts(3)).unwrap();

        assert_eq!(outcome, ConfirmOutcome::AlreadyApproved);
        assert_eq!(entry, snapshot);
    }

    #[test]
    fn confirm_from_trial_is_allowed() {
        let mut entry = trial_entry();
        assert_eq!(
            entry.confirm_approved(group(3), "P1", amount(1990), ts(2)).unwrap(),
            ConfirmOutcome::Approved
        );
    }

    // ════════════════════════════════════════════════════════════════════════
    // cancel_pending
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn cancel_with_open_trial_window_reverts() {
        let mut entry = trial_entry();
        entry.mark_pending(None, Some("pref".into()), ts(2)).unwrap();

        let disposition = entry.cancel_pending(ts(3)).unwrap();

        assert_eq!(disposition, CancelDisposition::RevertToTrial);
        assert_eq!(entry.status, AccessStatus::Trial);
        assert_eq!(entry.trial_expires_at, Some(ts(4)));
        assert!(entry.payment_reference.is_none());
    }

    #[test]
    fn cancel_with_expired_window_deletes() {
        let mut entry = trial_entry();
        entry.mark_pending(None, None, ts(2)).unwrap();
        assert_eq!(entry.cancel_pending(ts(6)).unwrap(), CancelDisposition::Delete);
    }

    #[test]
    fn cancel_without_trial_deletes() {
        let mut entry = pending_entry();
        assert_eq!(entry.cancel_pending(ts(1)).unwrap(), CancelDisposition::Delete);
    }

    #[test]
    fn cancel_on_trial_or_approved_does_nothing() {
        let mut entry = trial_entry();
        assert_eq!(entry.cancel_pending(ts(2)).unwrap(), CancelDisposition::NotPending);
        assert_eq!(entry.status, AccessStatus::Trial);
    }

    #[test]
    fn pending_entry_can_become_trial() {
        let mut entry = pending_entry();
        entry.start_trial(group(2), ts(4), ts(1)).unwrap();
        assert_eq!(entry.status, AccessStatus::Trial);
        assert_eq!(entry.trial_expires_at, Some(ts(4)));
        assert!(entry.payment_reference.is_none());
    }

    // ════════════════════════════════════════════════════════════════════════
    // admin_override
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn admin_can_downgrade_approved() {
        let mut entry = pending_entry();
        entry.confirm_approved(group(5), "P1", amount(1690), ts(2)).unwrap();
        entry.admin_override(AccessStatus::Pending, group(2), ts(3));
        assert_eq!(entry.status, AccessStatus::Pending);
        assert_eq!(entry.group, group(2));
    }
}
