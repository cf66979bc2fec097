//! Resend email adapter.
//!
//! `POST {base}/emails` with a bearer API key and
//! `{"from", "to": [..], "subject", "html"}`.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::config::EmailConfig;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{EmailMessage, EmailSender};

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ResendEmailSender {
    api_key: SecretString,
    from: String,
    api_base_url: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

impl ResendEmailSender {
    pub fn new(
        api_key: SecretString,
        from: impl Into<String>,
        api_base_url: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Self {
            api_key,
            from: from.into(),
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// `None` when no API key is configured.
    pub fn from_config(config: &EmailConfig) -> Option<Result<Self, reqwest::Error>> {
        let key = config.api_key()?.clone();
        Some(Self::new(key, config.from_header(), config.api_base_url.clone()))
    }

    fn body<'a>(&'a self, message: &'a EmailMessage) -> SendEmailBody<'a> {
        SendEmailBody {
            from: &self.from,
            to: [message.to.as_str()],
            subject: &message.subject,
            html: &message.html,
        }
    }
}

#[async_trait]
impl EmailSender for ResendEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), DomainError> {
        let response = self
            .http_client
            .post(format!("{}/emails", self.api_base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&self.body(message))
            .send()
            .await
            .map_err(|e| {
                DomainError::new(ErrorCode::InternalError, format!("Email request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, to = %message.to, "Resend API error");
            return Err(DomainError::new(
                ErrorCode::InternalError,
                format!("Email provider returned {}", status.as_u16()),
            ));
        }

        tracing::debug!(to = %message.to, subject = %message.subject, "Email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> ResendEmailSender {
        ResendEmailSender::new(
            SecretString::new("re_test".into()),
            "Cronograma <a@b.c>",
            "http://127.0.0.1:9/",
        )
        .unwrap()
    }

    #[test]
    fn body_serializes_single_recipient() {
        let sender = sender();
        let message = EmailMessage {
            to: "x@y.z".into(),
            subject: "Hi".into(),
            html: "<b>ok</b>".into(),
        };

        let json = serde_json::to_value(sender.body(&message)).unwrap();

        assert_eq!(json["to"], serde_json::json!(["x@y.z"]));
        assert_eq!(json["from"], "Cronograma <a@b.c>");
    }

    #[test]
    fn from_config_uses_from_header() {
        let config = EmailConfig {
            resend_api_key: Some(SecretString::new("re_abc".into())),
            ..Default::default()
        };
        let sender = ResendEmailSender::from_config(&config).unwrap().unwrap();
        assert_eq!(sender.from, config.from_header());
    }

    #[tokio::test]
    async fn unreachable_provider_is_an_error() {
        let message = EmailMessage {
            to: "x@y.z".into(),
            subject: "Hi".into(),
            html: String::new(),
        };
        assert!(sender().send(&message).await.is_err());
    }
}
