use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::foundation::{DomainError, SubjectId, UserId};
use crate::domain::referral::ReferralCommission;
use crate::ports::{CommissionLedger, SaveResult};

#[derive(Default)]
pub struct InMemoryCommissionLedger {
    rows: Mutex<Vec<ReferralCommission>>,
}

impl InMemoryCommissionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<ReferralCommission> {
        self.rows.lock().await.clone()
    }
}

#[async_trait]
impl CommissionLedger for InMemoryCommissionLedger {
    async fn exists(
        &self,
        affiliate_user_id: &UserId,
        referred_user_id: &UserId,
        subject_id: &SubjectId,
    ) -> Result<bool, DomainError> {
        Ok(self.rows.lock().await.iter().any(|c| {
            &c.affiliate_user_id == affiliate_user_id
                && &c.referred_user_id == referred_user_id
                && &c.subject_id == subject_id
        }))
    }

    async fn referred_users(&self, affiliate_user_id: &UserId) -> Result<Vec<UserId>, DomainError> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .filter(|c| &c.affiliate_user_id == affiliate_user_id)
            .map(|c| c.referred_user_id.clone())
            .collect())
    }

    async fn insert(&self, commission: &ReferralCommission) -> Result<SaveResult, DomainError> {
        let mut rows = self.rows.lock().await;
        let duplicate = rows.iter().any(|c| {
            c.affiliate_user_id == commission.affiliate_user_id
                && c.referred_user_id == commission.referred_user_id
                && c.subject_id == commission.subject_id
        });
        if duplicate {
            return Ok(SaveResult::AlreadyExists);
        }
        rows.push(commission.clone());
        Ok(SaveResult::Inserted)
    }
}
