//! Rotation Access server binary.
//!
//! Loads configuration, connects to PostgreSQL, builds the adapters and
//! serves the axum application.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rotation_access::adapters::auth::{GoTrueIdentityAdmin, JwtSessionValidator};
use rotation_access::adapters::email;
use rotation_access::adapters::http::{app, AppSettings, AppState, HttpOptions};
use rotation_access::adapters::mercadopago::{MercadoPagoConfig, MercadoPagoGateway};
use rotation_access::adapters::postgres::{
    self, PostgresAccessRepository, PostgresCommissionLedger, PostgresEventLog,
    PostgresProfileRepository, PostgresSessionStore, PostgresSubscriptionRepository,
    PostgresUserDataPurger,
};
use rotation_access::config::AppConfig;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    if !config.payment.has_webhook_secret() {
        tracing::warn!("No webhook secret configured; every gateway notification will be rejected");
    }

    let pool = postgres::connect(&config.database).await?;

    let gateway = MercadoPagoGateway::new(MercadoPagoConfig::from_payment_config(&config.payment))?;
    if config.payment.is_sandbox() {
        tracing::info!("Payment gateway in sandbox mode");
    }

    let state = AppState {
        access_repository: Arc::new(PostgresAccessRepository::new(pool.clone())),
        subscription_repository: Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
        profile_repository: Arc::new(PostgresProfileRepository::new(pool.clone())),
        commission_ledger: Arc::new(PostgresCommissionLedger::new(pool.clone())),
        session_store: Arc::new(PostgresSessionStore::new(pool.clone())),
        user_data_purger: Arc::new(PostgresUserDataPurger::new(pool.clone())),
        event_log: Arc::new(PostgresEventLog::new(pool)),
        payment_gateway: Arc::new(gateway),
        email_sender: email::from_config(&config.email),
        identity_admin: Arc::new(GoTrueIdentityAdmin::from_config(&config.auth)?),
        session_validator: Arc::new(JwtSessionValidator::from_config(&config.auth)),
        settings: Arc::new(AppSettings::from_config(&config)?),
    };

    let options = HttpOptions {
        request_timeout: Duration::from_secs(config.server.request_timeout_secs),
        cors_origins: config.server.cors_origins_list(),
    };
    let router = app(state, &options);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Rotation access listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// JSON logs in production, pretty logs otherwise. `RUST_LOG` wins over
/// `server.log_level`.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone()));

    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() {
        registry.with(fmt::layer().json().with_current_span(true)).init();
    } else {
        registry.with(fmt::layer().pretty()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
