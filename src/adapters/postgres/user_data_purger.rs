//! PostgreSQL implementation of UserDataPurger.
//!
//! One statement per table. Callers run them independently so a failure in
//! one table leaves the others to be cleared.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::admin::UserDataTable;
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::UserDataPurger;

use super::rows::db_error;

pub struct PostgresUserDataPurger {
    pool: PgPool,
}

impl PostgresUserDataPurger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn delete_statement(table: UserDataTable) -> &'static str {
    match table {
        UserDataTable::CommissionsAsAffiliate => {
            "DELETE FROM referral_commissions WHERE affiliate_user_id = $1"
        }
        UserDataTable::CommissionsAsReferred => {
            "DELETE FROM referral_commissions WHERE referred_user_id = $1"
        }
        UserDataTable::Sessions => "DELETE FROM sessions WHERE user_id = $1",
        UserDataTable::Progress => "DELETE FROM progress WHERE user_id = $1",
        // Trial grants go with the access rows they were issued for.
        UserDataTable::Access => {
            "WITH grants AS (DELETE FROM trial_grants WHERE user_id = $1) \
             DELETE FROM access_entries WHERE user_id = $1"
        }
        UserDataTable::SupportTickets => "DELETE FROM support_tickets WHERE user_id = $1",
        UserDataTable::Events => "DELETE FROM events WHERE user_id = $1",
        UserDataTable::Profile => "DELETE FROM profiles WHERE user_id = $1",
    }
}

#[async_trait]
impl UserDataPurger for PostgresUserDataPurger {
    async fn purge(&self, table: UserDataTable, user_id: &UserId) -> Result<u64, DomainError> {
        let result = sqlx::query(delete_statement(table))
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(&format!("purge {}", table.as_str()), e))?;

        Ok(result.rows_affected())
    }
}
