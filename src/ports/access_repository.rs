//! AccessRepository port - storage for access entries and trial grants.
//!
//! Every write is a compare-and-swap on `AccessEntry::version`:
//!
//! - `version == 0`: insert; fails if a row for (user, subject) already exists
//! - `version > 0`: update/delete only where the stored version still matches
//!
//! A lost race surfaces as `ErrorCode::ConcurrentModification`. Callers reload
//! and retry; the repository never silently overwrites.

use async_trait::async_trait;

use crate::domain::access::{AccessEntry, TrialGrant};
use crate::domain::foundation::{DomainError, SubjectId, UserId};

#[async_trait]
pub trait AccessRepository: Send + Sync {
    /// Reads one entry. Always hits the store of record.
    async fn find(
        &self,
        user_id: &UserId,
        subject_id: &SubjectId,
    ) -> Result<Option<AccessEntry>, DomainError>;

    /// All entries of a user, any status.
    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<AccessEntry>, DomainError>;

    /// Inserts (version 0) or compare-and-swaps (version > 0) the entry.
    async fn save(&self, entry: &AccessEntry) -> Result<(), DomainError>;

    /// Saves the entry and records the user's lifetime trial grant atomically.
    ///
    /// Fails with `ErrorCode::TrialAlreadyUsed` if any grant exists for the
    /// user; in that case nothing is written.
    async fn save_with_trial_grant(
        &self,
        entry: &AccessEntry,
        grant: &TrialGrant,
    ) -> Result<(), DomainError>;

    /// Deletes the entry if its stored version still matches.
    async fn delete(&self, entry: &AccessEntry) -> Result<(), DomainError>;

    /// Every trial ever granted to the user.
    async fn trial_grants(&self, user_id: &UserId) -> Result<Vec<TrialGrant>, DomainError>;
}
