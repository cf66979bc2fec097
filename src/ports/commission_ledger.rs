//! CommissionLedger port - affiliate commission records.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, SubjectId, UserId};
use crate::domain::referral::ReferralCommission;

use super::SaveResult;

#[async_trait]
pub trait CommissionLedger: Send + Sync {
    /// True if a commission exists for the triple.
    async fn exists(
        &self,
        affiliate_user_id: &UserId,
        referred_user_id: &UserId,
        subject_id: &SubjectId,
    ) -> Result<bool, DomainError>;

    /// Referred user of every commission credited to the affiliate.
    /// May contain repeats; callers dedupe.
    async fn referred_users(&self, affiliate_user_id: &UserId) -> Result<Vec<UserId>, DomainError>;

    /// Inserts unless the (affiliate, referred, subject) triple exists.
    async fn insert(&self, commission: &ReferralCommission) -> Result<SaveResult, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn _accepts_dyn(_ledger: &dyn CommissionLedger) {}
}
