//! Email adapters.
//!
//! - `ResendEmailSender` - Resend HTTP API
//! - `LogOnlyEmailSender` - logs and drops mail when no API key is configured

mod log_only;
mod resend;

pub use log_only::LogOnlyEmailSender;
pub use resend::ResendEmailSender;

use std::sync::Arc;

use crate::config::EmailConfig;
use crate::ports::EmailSender;

/// Resend when an API key is configured, otherwise the logging sender.
pub fn from_config(config: &EmailConfig) -> Arc<dyn EmailSender> {
    match ResendEmailSender::from_config(config) {
        Some(Ok(sender)) => Arc::new(sender),
        Some(Err(err)) => {
            tracing::error!(error = %err, "Failed to build email client, mail will be logged only");
            Arc::new(LogOnlyEmailSender)
        }
        None => {
            tracing::warn!("No Resend API key configured, mail will be logged only");
            Arc::new(LogOnlyEmailSender)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::EmailMessage;
    use secrecy::SecretString;

    #[tokio::test]
    async fn missing_key_falls_back_to_logging() {
        let sender = from_config(&EmailConfig::default());
        let message = EmailMessage {
            to: "a@b.c".into(),
            subject: "s".into(),
            html: "<p>x</p>".into(),
        };
        assert!(sender.send(&message).await.is_ok());
    }

    #[test]
    fn empty_key_counts_as_missing() {
        let config = EmailConfig {
            resend_api_key: Some(SecretString::new(String::new())),
            ..Default::default()
        };
        assert!(ResendEmailSender::from_config(&config).is_none());
    }
}
