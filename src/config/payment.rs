//! Payment gateway configuration (Mercado Pago)

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Access tokens of the gateway's test environment start with this.
const SANDBOX_TOKEN_PREFIX: &str = "TEST-";

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Gateway access token, sent as a bearer token
    pub access_token: SecretString,

    /// Shared secret for notification signatures.
    ///
    /// May be empty; every notification is then rejected.
    #[serde(default = "empty_secret")]
    pub webhook_secret: SecretString,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Timeout for each gateway call, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl PaymentConfig {
    /// True when the access token belongs to the test environment.
    pub fn is_sandbox(&self) -> bool {
        self.access_token
            .expose_secret()
            .starts_with(SANDBOX_TOKEN_PREFIX)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn has_webhook_secret(&self) -> bool {
        !self.webhook_secret.expose_secret().is_empty()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.access_token.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__ACCESS_TOKEN"));
        }
        if reqwest::Url::parse(&self.api_base_url).is_err() {
            return Err(ValidationError::InvalidUrl("payment.api_base_url"));
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 60 {
            return Err(ValidationError::InvalidTimeout);
        }
        if !self.has_webhook_secret() {
            tracing::warn!("Payment webhook secret is empty; all notifications will be rejected");
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            access_token: empty_secret(),
            webhook_secret: empty_secret(),
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn empty_secret() -> SecretString {
    SecretString::new(String::new())
}

fn default_api_base_url() -> String {
    "https://api.mercadopago.com".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_token(token: &str) -> PaymentConfig {
        PaymentConfig {
            access_token: SecretString::new(token.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_sandbox_detected_from_token_prefix() {
        assert!(with_token("TEST-123-abc").is_sandbox());
        assert!(!with_token("APP_USR-123-abc").is_sandbox());
    }

    #[test]
    fn test_missing_token_is_invalid() {
        assert!(PaymentConfig::default().validate().is_err());
    }

    #[test]
    fn test_empty_webhook_secret_is_allowed() {
        let config = with_token("APP_USR-1");
        assert!(!config.has_webhook_secret());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_timeout_bounds() {
        let config = PaymentConfig {
            request_timeout_secs: 0,
            ..with_token("APP_USR-1")
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let rendered = format!("{:?}", with_token("APP_USR-secret-token"));
        assert!(!rendered.contains("secret-token"));
    }
}
