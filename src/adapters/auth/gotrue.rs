//! Identity provider admin API (GoTrue compatible).
//!
//! - `DELETE {base}/admin/users/{id}`
//! - `PUT {base}/admin/users/{id}` with `{"password": ..}`
//!
//! Both calls carry the service key as `apikey` and as a bearer token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::config::AuthConfig;
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::IdentityAdmin;

const ADMIN_TIMEOUT: Duration = Duration::from_secs(10);

pub struct GoTrueIdentityAdmin {
    base_url: String,
    service_key: SecretString,
    http_client: reqwest::Client,
}

#[derive(Serialize)]
struct PasswordUpdate<'a> {
    password: &'a str,
}

impl GoTrueIdentityAdmin {
    pub fn new(base_url: impl Into<String>, service_key: SecretString) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().timeout(ADMIN_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key,
            http_client,
        })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.identity_admin_url.clone(), config.service_key.clone())
    }

    fn user_url(&self, user_id: &UserId) -> String {
        format!("{}/admin/users/{}", self.base_url, user_id)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let key = self.service_key.expose_secret();
        builder.header("apikey", key.as_str()).bearer_auth(key)
    }
}

fn request_error(operation: &str, err: reqwest::Error) -> DomainError {
    tracing::error!(operation, error = %err, "Identity admin request failed");
    DomainError::new(
        ErrorCode::InternalError,
        format!("Identity provider unreachable during {}: {}", operation, err),
    )
}

fn status_error(operation: &str, status: StatusCode, body: &str) -> DomainError {
    tracing::error!(operation, status = status.as_u16(), body = %body, "Identity admin API error");
    DomainError::new(
        ErrorCode::InternalError,
        format!("Identity provider returned {} during {}", status.as_u16(), operation),
    )
}

#[async_trait]
impl IdentityAdmin for GoTrueIdentityAdmin {
    async fn delete_user(&self, user_id: &UserId) -> Result<(), DomainError> {
        let response = self
            .authorized(self.http_client.delete(self.user_url(user_id)))
            .send()
            .await
            .map_err(|e| request_error("delete user", e))?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            tracing::info!(user_id = %user_id, "Identity user deleted");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error("delete user", status, &body))
    }

    async fn set_password(&self, user_id: &UserId, password: &str) -> Result<(), DomainError> {
        let response = self
            .authorized(self.http_client.put(self.user_url(user_id)))
            .json(&PasswordUpdate { password })
            .send()
            .await
            .map_err(|e| request_error("set password", e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(DomainError::new(
                ErrorCode::ProfileNotFound,
                format!("Identity user {} not found", user_id),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error("set password", status, &body));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_url_joins_base_and_id() {
        let admin = GoTrueIdentityAdmin::new(
            "https://id.example.com/auth/v1/",
            SecretString::new("svc".into()),
        )
        .unwrap();

        let url = admin.user_url(&UserId::new("abc").unwrap());

        assert_eq!(url, "https://id.example.com/auth/v1/admin/users/abc");
    }

    #[tokio::test]
    async fn unreachable_provider_is_an_error() {
        let admin =
            GoTrueIdentityAdmin::new("http://127.0.0.1:9", SecretString::new("svc".into()))
                .unwrap();

        let result = admin.delete_user(&UserId::new("abc").unwrap()).await;

        assert!(result.is_err());
    }
}
