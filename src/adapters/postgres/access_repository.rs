//! PostgreSQL implementation of AccessRepository.
//!
//! Writes are compare-and-swap on `version`. An insert that hits the
//! (user_id, subject_id) primary key and an update whose version no longer
//! matches both surface as `ConcurrentModification`, so the ledger reloads
//! and retries instead of overwriting.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::domain::access::{AccessEntry, TrialGrant};
use crate::domain::foundation::{
    DomainError, ErrorCode, GroupNumber, SubjectId, UserId,
};
use crate::ports::AccessRepository;

use super::rows::{corrupt, datetime, db_error, money, opt_datetime, timestamp};

pub struct PostgresAccessRepository {
    pool: PgPool,
}

impl PostgresAccessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AccessRow {
    user_id: String,
    subject_id: String,
    group_number: i16,
    status: String,
    trial_expires_at: Option<DateTime<Utc>>,
    payment_reference: Option<String>,
    amount_paid_cents: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<AccessRow> for AccessEntry {
    type Error = DomainError;

    fn try_from(row: AccessRow) -> Result<Self, Self::Error> {
        Ok(AccessEntry {
            user_id: UserId::new(row.user_id).map_err(|e| corrupt("user_id", e))?,
            subject_id: SubjectId::new(row.subject_id).map_err(|e| corrupt("subject_id", e))?,
            group: GroupNumber::new(i32::from(row.group_number))
                .map_err(|e| corrupt("group_number", e))?,
            status: row.status.parse().map_err(|e| corrupt("status", e))?,
            trial_expires_at: row.trial_expires_at.map(timestamp),
            payment_reference: row.payment_reference,
            amount_paid: row
                .amount_paid_cents
                .map(|cents| money("amount_paid_cents", cents))
                .transpose()?,
            created_at: timestamp(row.created_at),
            updated_at: timestamp(row.updated_at),
            version: row.version,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TrialGrantRow {
    user_id: String,
    subject_id: String,
    granted_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl TryFrom<TrialGrantRow> for TrialGrant {
    type Error = DomainError;

    fn try_from(row: TrialGrantRow) -> Result<Self, Self::Error> {
        Ok(TrialGrant {
            user_id: UserId::new(row.user_id).map_err(|e| corrupt("user_id", e))?,
            subject_id: SubjectId::new(row.subject_id).map_err(|e| corrupt("subject_id", e))?,
            granted_at: timestamp(row.granted_at),
            expires_at: timestamp(row.expires_at),
        })
    }
}

/// Insert (version 0) or compare-and-swap (version > 0) on one connection.
async fn write_entry(conn: &mut PgConnection, entry: &AccessEntry) -> Result<(), DomainError> {
    let group = i16::from(entry.group.value());
    let amount = entry.amount_paid.map(|m| m.cents());

    let result = if entry.is_persisted() {
        sqlx::query(
            r#"
            UPDATE access_entries SET
                group_number = $3,
                status = $4,
                trial_expires_at = $5,
                payment_reference = $6,
                amount_paid_cents = $7,
                updated_at = $8,
                version = version + 1
            WHERE user_id = $1 AND subject_id = $2 AND version = $9
            "#,
        )
        .bind(entry.user_id.as_str())
        .bind(entry.subject_id.as_str())
        .bind(group)
        .bind(entry.status.as_str())
        .bind(opt_datetime(entry.trial_expires_at.as_ref()))
        .bind(&entry.payment_reference)
        .bind(amount)
        .bind(datetime(&entry.updated_at))
        .bind(entry.version)
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("update access entry", e))?
    } else {
        sqlx::query(
            r#"
            INSERT INTO access_entries (
                user_id, subject_id, group_number, status, trial_expires_at,
                payment_reference, amount_paid_cents, created_at, updated_at, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 1)
            ON CONFLICT (user_id, subject_id) DO NOTHING
            "#,
        )
        .bind(entry.user_id.as_str())
        .bind(entry.subject_id.as_str())
        .bind(group)
        .bind(entry.status.as_str())
        .bind(opt_datetime(entry.trial_expires_at.as_ref()))
        .bind(&entry.payment_reference)
        .bind(amount)
        .bind(datetime(&entry.created_at))
        .bind(datetime(&entry.updated_at))
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("insert access entry", e))?
    };

    if result.rows_affected() == 0 {
        return Err(DomainError::concurrent_modification(format!(
            "access entry ({}, {}) changed since version {}",
            entry.user_id, entry.subject_id, entry.version
        )));
    }
    Ok(())
}

#[async_trait]
impl AccessRepository for PostgresAccessRepository {
    async fn find(
        &self,
        user_id: &UserId,
        subject_id: &SubjectId,
    ) -> Result<Option<AccessEntry>, DomainError> {
        let row: Option<AccessRow> = sqlx::query_as(
            r#"
            SELECT user_id, subject_id, group_number, status, trial_expires_at,
                   payment_reference, amount_paid_cents, created_at, updated_at, version
            FROM access_entries
            WHERE user_id = $1 AND subject_id = $2
            "#,
        )
        .bind(user_id.as_str())
        .bind(subject_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find access entry", e))?;

        row.map(AccessEntry::try_from).transpose()
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<AccessEntry>, DomainError> {
        let rows: Vec<AccessRow> = sqlx::query_as(
            r#"
            SELECT user_id, subject_id, group_number, status, trial_expires_at,
                   payment_reference, amount_paid_cents, created_at, updated_at, version
            FROM access_entries
            WHERE user_id = $1
            ORDER BY subject_id
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list access entries", e))?;

        rows.into_iter().map(AccessEntry::try_from).collect()
    }

    async fn save(&self, entry: &AccessEntry) -> Result<(), DomainError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| db_error("acquire connection", e))?;
        write_entry(&mut conn, entry).await
    }

    async fn save_with_trial_grant(
        &self,
        entry: &AccessEntry,
        grant: &TrialGrant,
    ) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("begin transaction", e))?;

        let granted = sqlx::query(
            r#"
            INSERT INTO trial_grants (user_id, subject_id, granted_at, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(grant.user_id.as_str())
        .bind(grant.subject_id.as_str())
        .bind(datetime(&grant.granted_at))
        .bind(datetime(&grant.expires_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("insert trial grant", e))?;

        if granted.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            return Err(DomainError::new(
                ErrorCode::TrialAlreadyUsed,
                "user already received a trial",
            ));
        }

        write_entry(&mut tx, entry).await?;

        tx.commit()
            .await
            .map_err(|e| db_error("commit trial grant", e))
    }

    async fn delete(&self, entry: &AccessEntry) -> Result<(), DomainError> {
        let result = sqlx::query(
            "DELETE FROM access_entries WHERE user_id = $1 AND subject_id = $2 AND version = $3",
        )
        .bind(entry.user_id.as_str())
        .bind(entry.subject_id.as_str())
        .bind(entry.version)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("delete access entry", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::concurrent_modification(format!(
                "access entry ({}, {}) changed before delete",
                entry.user_id, entry.subject_id
            )));
        }
        Ok(())
    }

    async fn trial_grants(&self, user_id: &UserId) -> Result<Vec<TrialGrant>, DomainError> {
        let rows: Vec<TrialGrantRow> = sqlx::query_as(
            "SELECT user_id, subject_id, granted_at, expires_at FROM trial_grants WHERE user_id = $1",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list trial grants", e))?;

        rows.into_iter().map(TrialGrant::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::AccessStatus;

    fn row(status: &str, group: i16) -> AccessRow {
        let now = Utc::now();
        AccessRow {
            user_id: "u1".into(),
            subject_id: "cm".into(),
            group_number: group,
            status: status.into(),
            trial_expires_at: Some(now),
            payment_reference: Some("123".into()),
            amount_paid_cents: Some(1690),
            created_at: now,
            updated_at: now,
            version: 3,
        }
    }

    #[test]
    fn row_converts_to_entry() {
        let entry = AccessEntry::try_from(row("approved", 5)).unwrap();
        assert_eq!(entry.status, AccessStatus::Approved);
        assert_eq!(entry.group.value(), 5);
        assert_eq!(entry.amount_paid.unwrap().cents(), 1690);
        assert_eq!(entry.version, 3);
    }

    #[test]
    fn unknown_status_is_database_error() {
        let err = AccessEntry::try_from(row("none", 5)).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn out_of_range_group_is_database_error() {
        let err = AccessEntry::try_from(row("trial", 11)).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }
}
