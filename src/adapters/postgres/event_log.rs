//! PostgreSQL implementation of EventLog.
//!
//! `event_type` is the event kind; `metadata` is the full tagged payload.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::DomainError;
use crate::domain::settlement::EventRecord;
use crate::ports::EventLog;

use super::rows::{datetime, db_error};

pub struct PostgresEventLog {
    pool: PgPool,
}

impl PostgresEventLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventLog for PostgresEventLog {
    async fn append(&self, record: &EventRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO events (id, user_id, event_type, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.user_id.as_ref().map(|id| id.as_str()))
        .bind(record.event.kind())
        .bind(Json(&record.event))
        .bind(datetime(&record.occurred_at))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("append event", e))?;

        Ok(())
    }
}
