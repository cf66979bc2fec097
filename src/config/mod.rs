//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables use the `ROTATION_ACCESS` prefix
//! and `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use rotation_access::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod access;
mod auth;
mod database;
mod email;
mod error;
mod payment;
mod pricing;
mod server;

pub use access::AccessConfig;
pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use email::EmailConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use pricing::PricingConfig;
pub use server::{Environment, ServerConfig, NOTIFICATION_PATH};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub database: DatabaseConfig,

    /// Payment gateway credentials
    pub payment: PaymentConfig,

    #[serde(default)]
    pub pricing: PricingConfig,

    /// Trial, module window and session limits
    #[serde(default)]
    pub access: AccessConfig,

    /// Token validation and identity provider admin API
    pub auth: AuthConfig,

    #[serde(default)]
    pub email: EmailConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` if present (development)
    /// 2. Reads variables with the `ROTATION_ACCESS` prefix
    /// 3. Splits nested keys on `__`
    ///
    /// - `ROTATION_ACCESS__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `ROTATION_ACCESS__PAYMENT__ACCESS_TOKEN=...` -> `payment.access_token`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ROTATION_ACCESS")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Semantic validation of every section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate(self.server.request_timeout_secs)?;
        self.payment.validate()?;
        self.pricing.validate()?;
        self.access.validate()?;
        self.auth.validate(&self.server.environment)?;
        self.email.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
