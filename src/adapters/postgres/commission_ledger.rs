//! PostgreSQL implementation of CommissionLedger.
//!
//! The unique (affiliate, referred, subject) constraint is what makes
//! crediting idempotent; `insert` relies on `ON CONFLICT DO NOTHING`.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, SubjectId, UserId};
use crate::domain::referral::ReferralCommission;
use crate::ports::{CommissionLedger, SaveResult};

use super::rows::{corrupt, datetime, db_error};

pub struct PostgresCommissionLedger {
    pool: PgPool,
}

impl PostgresCommissionLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommissionLedger for PostgresCommissionLedger {
    async fn exists(
        &self,
        affiliate_user_id: &UserId,
        referred_user_id: &UserId,
        subject_id: &SubjectId,
    ) -> Result<bool, DomainError> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM referral_commissions
                WHERE affiliate_user_id = $1 AND referred_user_id = $2 AND subject_id = $3
            )
            "#,
        )
        .bind(affiliate_user_id.as_str())
        .bind(referred_user_id.as_str())
        .bind(subject_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("check commission", e))
    }

    async fn referred_users(&self, affiliate_user_id: &UserId) -> Result<Vec<UserId>, DomainError> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT referred_user_id FROM referral_commissions WHERE affiliate_user_id = $1",
        )
        .bind(affiliate_user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list referred users", e))?;

        ids.into_iter()
            .map(|id| UserId::new(id).map_err(|e| corrupt("referred_user_id", e)))
            .collect()
    }

    async fn insert(&self, commission: &ReferralCommission) -> Result<SaveResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO referral_commissions (
                affiliate_user_id, referred_user_id, subject_id, sale_amount_cents,
                commission_percent, commission_amount_cents, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT ON CONSTRAINT referral_commissions_unique_sale DO NOTHING
            "#,
        )
        .bind(commission.affiliate_user_id.as_str())
        .bind(commission.referred_user_id.as_str())
        .bind(commission.subject_id.as_str())
        .bind(commission.sale_amount.cents())
        .bind(i16::from(commission.commission_percent))
        .bind(commission.commission_amount.cents())
        .bind(datetime(&commission.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert commission", e))?;

        Ok(if result.rows_affected() == 0 {
            SaveResult::AlreadyExists
        } else {
            SaveResult::Inserted
        })
    }
}
