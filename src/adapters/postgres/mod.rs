//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresAccessRepository` - Access entries and trial grants (version CAS)
//! - `PostgresSubscriptionRepository` - Subscriptions and processed recurring payments
//! - `PostgresCommissionLedger` - Referral commissions (unique per sale)
//! - `PostgresProfileRepository` - Profile flags and referral codes
//! - `PostgresSessionStore` - Admitted login sessions
//! - `PostgresEventLog` - Append-only audit events
//! - `PostgresUserDataPurger` - Per-table account deletion

mod access_repository;
mod commission_ledger;
mod event_log;
mod profile_repository;
mod rows;
mod session_store;
mod subscription_repository;
mod user_data_purger;

pub use access_repository::PostgresAccessRepository;
pub use commission_ledger::PostgresCommissionLedger;
pub use event_log::PostgresEventLog;
pub use profile_repository::PostgresProfileRepository;
pub use session_store::PostgresSessionStore;
pub use subscription_repository::PostgresSubscriptionRepository;
pub use user_data_purger::PostgresUserDataPurger;

use sqlx::PgPool;

use crate::config::DatabaseConfig;

/// Opens the pool and, if configured, applies `migrations/`.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = config
        .pool_options()
        .connect_with(config.connect_options()?)
        .await?;
    tracing::info!(
        max_connections = config.max_connections,
        statement_timeout_secs = config.statement_timeout_secs,
        "Database pool ready"
    );

    if config.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    Ok(pool)
}
