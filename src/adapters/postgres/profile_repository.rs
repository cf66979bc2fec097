use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ReferralCode, UserId};
use crate::ports::{Profile, ProfileRepository};

use super::rows::{corrupt, db_error};

/// Reads profile flags and referral codes; the only write is the VIP flag.
pub struct PostgresProfileRepository {
    pool: PgPool,
}

impl PostgresProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    user_id: String,
    email: Option<String>,
    name: Option<String>,
    referred_by: Option<String>,
    referral_code: Option<String>,
    is_admin: bool,
    is_vip: bool,
}

/// Blank codes are treated as absent; anything else must be well formed.
fn code(column: &str, value: Option<String>) -> Result<Option<ReferralCode>, DomainError> {
    match value {
        Some(v) if !v.trim().is_empty() => ReferralCode::new(v)
            .map(Some)
            .map_err(|e| corrupt(column, e)),
        _ => Ok(None),
    }
}

impl TryFrom<ProfileRow> for Profile {
    type Error = DomainError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Profile {
            user_id: UserId::new(row.user_id).map_err(|e| corrupt("user_id", e))?,
            email: row.email,
            name: row.name,
            referred_by: code("referred_by", row.referred_by)?,
            referral_code: code("referral_code", row.referral_code)?,
            is_admin: row.is_admin,
            is_vip: row.is_vip,
        })
    }
}

const SELECT_COLUMNS: &str =
    "SELECT user_id, email, name, referred_by, referral_code, is_admin, is_vip FROM profiles";

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn find(&self, user_id: &UserId) -> Result<Option<Profile>, DomainError> {
        let row: Option<ProfileRow> =
            sqlx::query_as(&format!("{} WHERE user_id = $1", SELECT_COLUMNS))
                .bind(user_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("find profile", e))?;

        row.map(Profile::try_from).transpose()
    }

    async fn find_by_referral_code(
        &self,
        code: &ReferralCode,
    ) -> Result<Option<Profile>, DomainError> {
        let row: Option<ProfileRow> =
            sqlx::query_as(&format!("{} WHERE referral_code = $1", SELECT_COLUMNS))
                .bind(code.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("find profile by referral code", e))?;

        row.map(Profile::try_from).transpose()
    }

    async fn set_vip(&self, user_id: &UserId, is_vip: bool) -> Result<bool, DomainError> {
        let result = sqlx::query("UPDATE profiles SET is_vip = $2 WHERE user_id = $1")
            .bind(user_id.as_str())
            .bind(is_vip)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("set vip flag", e))?;

        Ok(result.rows_affected() > 0)
    }
}
