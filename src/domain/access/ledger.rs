//! Access ledger service.
//!
//! Authoritative (user, subject) -> access state machine. Each operation is a
//! read-modify-write of a single row guarded by the repository's version
//! compare-and-swap; a lost race reloads the row and re-applies the operation
//! against the fresh state, up to `MAX_ATTEMPTS` times.
//!
//! Nothing here caches: every call re-reads the store of record.

use std::sync::Arc;

use crate::domain::foundation::{
    DomainError, ErrorCode, GroupNumber, Money, SubjectId, Timestamp, UserId,
};
use crate::ports::AccessRepository;

use super::{
    is_trial_eligible, AccessEntry, AccessError, AccessPolicy, AccessStatus, CancelDisposition,
    ConfirmOutcome, TrialGrant,
};

/// Attempts per operation before giving up with `AccessError::Conflict`.
pub const MAX_ATTEMPTS: u32 = 3;

pub struct AccessLedger {
    repository: Arc<dyn AccessRepository>,
    policy: AccessPolicy,
}

impl AccessLedger {
    pub fn new(repository: Arc<dyn AccessRepository>, policy: AccessPolicy) -> Self {
        Self { repository, policy }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub async fn get_access(
        &self,
        user_id: &UserId,
        subject_id: &SubjectId,
    ) -> Result<Option<AccessEntry>, AccessError> {
        Ok(self.repository.find(user_id, subject_id).await?)
    }

    pub async fn entries_for_user(&self, user_id: &UserId) -> Result<Vec<AccessEntry>, AccessError> {
        Ok(self.repository.find_by_user(user_id).await?)
    }

    pub async fn has_used_trial(&self, user_id: &UserId) -> Result<bool, AccessError> {
        let grants = self.repository.trial_grants(user_id).await?;
        Ok(!is_trial_eligible(&grants))
    }

    /// Grants the user's single lifetime trial on `subject_id`.
    pub async fn activate_trial(
        &self,
        user_id: &UserId,
        subject_id: &SubjectId,
        group: GroupNumber,
        now: Timestamp,
    ) -> Result<AccessEntry, AccessError> {
        let expires_at = self.policy.trial_expiry(now);

        for attempt in 1..=MAX_ATTEMPTS {
            let grants = self.repository.trial_grants(user_id).await?;
            if !is_trial_eligible(&grants) {
                tracing::info!(user_id = %user_id, subject_id = %subject_id, "Trial already used");
                return Err(AccessError::TrialAlreadyUsed(user_id.clone()));
            }

            let entry = match self.repository.find(user_id, subject_id).await? {
                Some(existing) if existing.grants_access(now) => {
                    return Err(AccessError::already_has_access(user_id, subject_id));
                }
                Some(mut existing) if existing.status == AccessStatus::Pending => {
                    existing.start_trial(group, expires_at, now)?;
                    existing
                }
                Some(_) => {
                    // Expired trial row without a grant record.
                    return Err(AccessError::TrialAlreadyUsed(user_id.clone()));
                }
                None => AccessEntry::new_trial(
                    user_id.clone(),
                    subject_id.clone(),
                    group,
                    expires_at,
                    now,
                ),
            };

            let grant = TrialGrant {
                user_id: user_id.clone(),
                subject_id: subject_id.clone(),
                granted_at: now,
                expires_at,
            };

            match self.repository.save_with_trial_grant(&entry, &grant).await {
                Ok(()) => {
                    tracing::info!(
                        user_id = %user_id,
                        subject_id = %subject_id,
                        group = %group,
                        expires_at = %expires_at.to_rfc3339(),
                        "Trial activated"
                    );
                    return Ok(persisted(entry));
                }
                Err(err) if err.code == ErrorCode::TrialAlreadyUsed => {
                    return Err(AccessError::TrialAlreadyUsed(user_id.clone()));
                }
                Err(err) => self.retry_or_fail(err, attempt, user_id, subject_id)?,
            }
        }

        Err(AccessError::conflict(user_id, subject_id))
    }

    /// Upserts the entry to pending for a checkout attempt.
    ///
    /// `group` is required when no row exists; otherwise `None` keeps the
    /// stored group.
    pub async fn mark_pending(
        &self,
        user_id: &UserId,
        subject_id: &SubjectId,
        group: Option<GroupNumber>,
        payment_reference: Option<String>,
        now: Timestamp,
    ) -> Result<AccessEntry, AccessError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let entry = match self.repository.find(user_id, subject_id).await? {
                Some(existing) if existing.is_approved() => {
                    return Err(AccessError::already_has_access(user_id, subject_id));
                }
                Some(mut existing) => {
                    existing.mark_pending(group, payment_reference.clone(), now)?;
                    existing
                }
                None => {
                    let group = group.ok_or_else(|| {
                        AccessError::validation("group", "required for a new access entry")
                    })?;
                    AccessEntry::new_pending(
                        user_id.clone(),
                        subject_id.clone(),
                        group,
                        payment_reference.clone(),
                        now,
                    )
                }
            };

            match self.repository.save(&entry).await {
                Ok(()) => {
                    tracing::info!(
                        user_id = %user_id,
                        subject_id = %subject_id,
                        group = %entry.group,
                        "Access marked pending"
                    );
                    return Ok(persisted(entry));
                }
                Err(err) => self.retry_or_fail(err, attempt, user_id, subject_id)?,
            }
        }

        Err(AccessError::conflict(user_id, subject_id))
    }

    /// Records a confirmed payment. Already-approved entries are left untouched.
    pub async fn confirm_approved(
        &self,
        user_id: &UserId,
        subject_id: &SubjectId,
        group: GroupNumber,
        payment_reference: &str,
        amount_paid: Money,
        now: Timestamp,
    ) -> Result<ConfirmOutcome, AccessError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let mut entry = match self.repository.find(user_id, subject_id).await? {
                Some(existing) => existing,
                None => AccessEntry::new_pending(
                    user_id.clone(),
                    subject_id.clone(),
                    group,
                    None,
                    now,
                ),
            };

            if entry.confirm_approved(group, payment_reference, amount_paid, now)?
                == ConfirmOutcome::AlreadyApproved
            {
                tracing::info!(
                    user_id = %user_id,
                    subject_id = %subject_id,
                    payment_reference = %payment_reference,
                    "Access already approved, skipping"
                );
                return Ok(ConfirmOutcome::AlreadyApproved);
            }

            match self.repository.save(&entry).await {
                Ok(()) => {
                    tracing::info!(
                        user_id = %user_id,
                        subject_id = %subject_id,
                        group = %group,
                        payment_reference = %payment_reference,
                        amount = %amount_paid,
                        "Access approved"
                    );
                    return Ok(ConfirmOutcome::Approved);
                }
                Err(err) => self.retry_or_fail(err, attempt, user_id, subject_id)?,
            }
        }

        Err(AccessError::conflict(user_id, subject_id))
    }

    /// Abandons a pending checkout: back to trial if the trial window is
    /// still open, otherwise the row is removed.
    pub async fn cancel_pending(
        &self,
        user_id: &UserId,
        subject_id: &SubjectId,
        now: Timestamp,
    ) -> Result<CancelDisposition, AccessError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let Some(mut entry) = self.repository.find(user_id, subject_id).await? else {
                return Ok(CancelDisposition::NotPending);
            };

            let disposition = entry.cancel_pending(now)?;
            let result = match disposition {
                CancelDisposition::NotPending => return Ok(disposition),
                CancelDisposition::RevertToTrial => self.repository.save(&entry).await,
                CancelDisposition::Delete => self.repository.delete(&entry).await,
            };

            match result {
                Ok(()) => {
                    tracing::info!(
                        user_id = %user_id,
                        subject_id = %subject_id,
                        disposition = ?disposition,
                        "Pending checkout cancelled"
                    );
                    return Ok(disposition);
                }
                Err(err) => self.retry_or_fail(err, attempt, user_id, subject_id)?,
            }
        }

        Err(AccessError::conflict(user_id, subject_id))
    }

    /// Support remediation. No business-rule checks; still serialized.
    pub async fn admin_override(
        &self,
        user_id: &UserId,
        subject_id: &SubjectId,
        status: AccessStatus,
        group: GroupNumber,
        now: Timestamp,
    ) -> Result<AccessEntry, AccessError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let mut entry = match self.repository.find(user_id, subject_id).await? {
                Some(existing) => existing,
                None => AccessEntry::new_pending(
                    user_id.clone(),
                    subject_id.clone(),
                    group,
                    None,
                    now,
                ),
            };
            entry.admin_override(status, group, now);
            if status == AccessStatus::Trial && entry.trial_expires_at.is_none() {
                entry.trial_expires_at = Some(self.policy.trial_expiry(now));
            }

            match self.repository.save(&entry).await {
                Ok(()) => {
                    tracing::warn!(
                        user_id = %user_id,
                        subject_id = %subject_id,
                        status = %status,
                        group = %group,
                        "Access overridden by admin"
                    );
                    return Ok(persisted(entry));
                }
                Err(err) => self.retry_or_fail(err, attempt, user_id, subject_id)?,
            }
        }

        Err(AccessError::conflict(user_id, subject_id))
    }

    fn retry_or_fail(
        &self,
        err: DomainError,
        attempt: u32,
        user_id: &UserId,
        subject_id: &SubjectId,
    ) -> Result<(), AccessError> {
        if err.is_concurrent_modification() {
            tracing::debug!(
                user_id = %user_id,
                subject_id = %subject_id,
                attempt,
                "Access entry changed concurrently, retrying"
            );
            Ok(())
        } else {
            tracing::error!(
                user_id = %user_id,
                subject_id = %subject_id,
                error = %err,
                "Access ledger write failed"
            );
            Err(err.into())
        }
    }
}

/// The entry as the repository now stores it.
fn persisted(mut entry: AccessEntry) -> AccessEntry {
    entry.version += 1;
    entry
}
