//! PostgreSQL implementation of SessionStore.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::session::SessionToken;
use crate::ports::SessionStore;

use super::rows::{datetime, db_error};

pub struct PostgresSessionStore {
    pool: PgPool,
}

impl PostgresSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn insert_and_trim(&self, session: &SessionToken, keep: usize) -> Result<u64, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("begin transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO sessions (token, user_id, device_info, created_at, last_seen_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&session.token)
        .bind(session.user_id.as_str())
        .bind(&session.device_info)
        .bind(datetime(&session.created_at))
        .bind(datetime(&session.last_seen_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("insert session", e))?;

        // The new session always survives; the rest of the quota goes to the
        // most recently created others.
        let others_kept = i64::try_from(keep.saturating_sub(1)).unwrap_or(i64::MAX);
        let evicted = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE user_id = $1
              AND token <> $2
              AND token NOT IN (
                  SELECT token FROM sessions
                  WHERE user_id = $1 AND token <> $2
                  ORDER BY created_at DESC
                  LIMIT $3
              )
            "#,
        )
        .bind(session.user_id.as_str())
        .bind(&session.token)
        .bind(others_kept)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("trim sessions", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("commit session", e))?;
        Ok(evicted.rows_affected())
    }

    async fn touch(&self, user_id: &UserId, token: &str, now: Timestamp) -> Result<bool, DomainError> {
        let result =
            sqlx::query("UPDATE sessions SET last_seen_at = $3 WHERE user_id = $1 AND token = $2")
                .bind(user_id.as_str())
                .bind(token)
                .bind(datetime(&now))
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("touch session", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, token: &str) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete session", e))?;
        Ok(())
    }

    async fn reap_stale(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM sessions WHERE last_seen_at < $1")
            .bind(datetime(&cutoff))
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("reap stale sessions", e))?;

        Ok(result.rows_affected())
    }
}
