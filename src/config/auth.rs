//! Authentication configuration
//!
//! Bearer tokens are HS256 JWTs issued by the identity provider and verified
//! locally with the shared secret. Admin calls (user deletion, password
//! reset) go to the provider's admin API with the service key.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret of the identity provider
    pub jwt_secret: SecretString,

    /// Expected `aud` claim
    #[serde(default = "default_jwt_audience")]
    pub jwt_audience: String,

    /// Base URL of the identity provider (admin API lives under `/admin`)
    pub identity_admin_url: String,

    /// Service role key for the admin API
    pub service_key: SecretString,
}

impl AuthConfig {
    /// In production, requires HTTPS for the identity provider.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.jwt_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__JWT_SECRET"));
        }
        if self.jwt_audience.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__JWT_AUDIENCE"));
        }
        if self.identity_admin_url.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__IDENTITY_ADMIN_URL"));
        }
        if reqwest::Url::parse(&self.identity_admin_url).is_err() {
            return Err(ValidationError::InvalidUrl("auth.identity_admin_url"));
        }
        if self.service_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__SERVICE_KEY"));
        }

        if *environment == Environment::Production
            && !self.identity_admin_url.starts_with("https://")
        {
            return Err(ValidationError::IdentityUrlMustBeHttps);
        }

        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: SecretString::new(String::new()),
            jwt_audience: default_jwt_audience(),
            identity_admin_url: String::new(),
            service_key: SecretString::new(String::new()),
        }
    }
}

fn default_jwt_audience() -> String {
    "authenticated".to_string()
}
