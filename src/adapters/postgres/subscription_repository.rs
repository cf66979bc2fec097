//! PostgreSQL implementation of SubscriptionRepository.
//!
//! Same version compare-and-swap as access entries. Recurring charges are
//! marked in `processed_subscription_payments` inside the transaction that
//! extends the period, so a redelivered charge is a no-op.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::domain::foundation::{DomainError, PaymentId, PreapprovalId, UserId};
use crate::domain::subscription::Subscription;
use crate::ports::{SaveResult, SubscriptionRepository};

use super::rows::{corrupt, datetime, db_error, money, opt_datetime, timestamp};

pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    user_id: String,
    preapproval_id: String,
    status: String,
    current_period_end: Option<DateTime<Utc>>,
    amount_cents: i64,
    cancelled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            user_id: UserId::new(row.user_id).map_err(|e| corrupt("user_id", e))?,
            preapproval_id: PreapprovalId::new(row.preapproval_id)
                .map_err(|e| corrupt("preapproval_id", e))?,
            status: row.status.parse().map_err(|e| corrupt("status", e))?,
            current_period_end: row.current_period_end.map(timestamp),
            amount: money("amount_cents", row.amount_cents)?,
            cancelled_at: row.cancelled_at.map(timestamp),
            created_at: timestamp(row.created_at),
            updated_at: timestamp(row.updated_at),
            version: row.version,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT user_id, preapproval_id, status, current_period_end, amount_cents,
           cancelled_at, created_at, updated_at, version
    FROM subscriptions
"#;

async fn write_subscription(
    conn: &mut PgConnection,
    subscription: &Subscription,
) -> Result<(), DomainError> {
    let result = if subscription.version > 0 {
        sqlx::query(
            r#"
            UPDATE subscriptions SET
                preapproval_id = $2,
                status = $3,
                current_period_end = $4,
                amount_cents = $5,
                cancelled_at = $6,
                updated_at = $7,
                version = version + 1
            WHERE user_id = $1 AND version = $8
            "#,
        )
        .bind(subscription.user_id.as_str())
        .bind(subscription.preapproval_id.as_str())
        .bind(subscription.status.as_str())
        .bind(opt_datetime(subscription.current_period_end.as_ref()))
        .bind(subscription.amount.cents())
        .bind(opt_datetime(subscription.cancelled_at.as_ref()))
        .bind(datetime(&subscription.updated_at))
        .bind(subscription.version)
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("update subscription", e))?
    } else {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                user_id, preapproval_id, status, current_period_end, amount_cents,
                cancelled_at, created_at, updated_at, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 1)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(subscription.user_id.as_str())
        .bind(subscription.preapproval_id.as_str())
        .bind(subscription.status.as_str())
        .bind(opt_datetime(subscription.current_period_end.as_ref()))
        .bind(subscription.amount.cents())
        .bind(opt_datetime(subscription.cancelled_at.as_ref()))
        .bind(datetime(&subscription.created_at))
        .bind(datetime(&subscription.updated_at))
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("insert subscription", e))?
    };

    if result.rows_affected() == 0 {
        return Err(DomainError::concurrent_modification(format!(
            "subscription of {} changed since version {}",
            subscription.user_id, subscription.version
        )));
    }
    Ok(())
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> =
            sqlx::query_as(&format!("{} WHERE user_id = $1", SELECT_COLUMNS))
                .bind(user_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("find subscription", e))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_by_preapproval(
        &self,
        preapproval_id: &PreapprovalId,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> =
            sqlx::query_as(&format!("{} WHERE preapproval_id = $1", SELECT_COLUMNS))
                .bind(preapproval_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("find subscription by preapproval", e))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| db_error("acquire connection", e))?;
        write_subscription(&mut conn, subscription).await
    }

    async fn save_with_payment(
        &self,
        subscription: &Subscription,
        payment_id: &PaymentId,
    ) -> Result<SaveResult, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("begin transaction", e))?;

        let marked = sqlx::query(
            r#"
            INSERT INTO processed_subscription_payments (payment_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (payment_id) DO NOTHING
            "#,
        )
        .bind(payment_id.as_str())
        .bind(subscription.user_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("mark recurring payment", e))?;

        if marked.rows_affected() == 0 {
            return Ok(SaveResult::AlreadyExists);
        }

        write_subscription(&mut tx, subscription).await?;

        tx.commit()
            .await
            .map_err(|e| db_error("commit recurring payment", e))?;
        Ok(SaveResult::Inserted)
    }
}
