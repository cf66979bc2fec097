//! Mercado Pago REST adapter.
//!
//! Implements the `PaymentGateway` port over the public REST API with a
//! bearer access token. Every call has a bounded timeout; a timeout or
//! connection failure surfaces as a retryable `GatewayError`.
//!
//! # Configuration
//!
//! ```ignore
//! let config = MercadoPagoConfig::new(access_token).with_timeout(Duration::from_secs(10));
//! let gateway = MercadoPagoGateway::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::config::PaymentConfig;
use crate::domain::foundation::{PaymentId, PreapprovalId};
use crate::ports::{
    GatewayAuthorizedPayment, GatewayError, GatewayPayment, GatewayPreapproval, HostedCheckout,
    PaymentGateway, PreapprovalRequest, PreferenceRequest,
};

use super::wire_types::{
    AuthorizedPaymentResponse, CheckoutResponse, PaymentResponse, PreapprovalBody,
    PreapprovalResponse, PreferenceBody,
};

const SANDBOX_TOKEN_PREFIX: &str = "TEST-";

/// Mercado Pago API configuration.
#[derive(Clone)]
pub struct MercadoPagoConfig {
    access_token: SecretString,
    api_base_url: String,
    timeout: Duration,
}

impl MercadoPagoConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::new(access_token.into()),
            api_base_url: "https://api.mercadopago.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn from_payment_config(config: &PaymentConfig) -> Self {
        Self {
            access_token: config.access_token.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Test credentials select the sandbox checkout link.
    pub fn is_sandbox(&self) -> bool {
        self.access_token
            .expose_secret()
            .starts_with(SANDBOX_TOKEN_PREFIX)
    }
}

pub struct MercadoPagoGateway {
    config: MercadoPagoConfig,
    http_client: reqwest::Client,
}

impl MercadoPagoGateway {
    pub fn new(config: MercadoPagoConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(self.config.access_token.expose_secret())
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        resource: &str,
        builder: RequestBuilder,
    ) -> Result<T, GatewayError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;
        let response = check_status(operation, resource, response).await?;
        response.json::<T>().await.map_err(|e| {
            tracing::error!(operation, error = %e, "Failed to parse gateway response");
            GatewayError::InvalidResponse(format!("{}: {}", operation, e))
        })
    }

    async fn create_checkout<B: serde::Serialize + Sync>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
    ) -> Result<HostedCheckout, GatewayError> {
        let response: CheckoutResponse = self
            .send(operation, path, self.http_client.post(self.url(path)).json(body))
            .await?;
        response.into_checkout().ok_or_else(|| {
            tracing::error!(operation, "Gateway response missing id or checkout link");
            GatewayError::InvalidResponse(format!("{}: missing id or init_point", operation))
        })
    }
}

fn transport_error(operation: &'static str, error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        tracing::warn!(operation, "Gateway request timed out");
        GatewayError::Timeout
    } else {
        tracing::warn!(operation, error = %error, "Gateway request failed");
        GatewayError::Network(error.to_string())
    }
}

async fn check_status(
    operation: &'static str,
    resource: &str,
    response: Response,
) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::error!(operation, status = status.as_u16(), body = %body, "Gateway API error");
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::Authentication,
        StatusCode::NOT_FOUND => GatewayError::NotFound(resource.to_string()),
        _ => GatewayError::Status {
            status: status.as_u16(),
            message: body,
        },
    })
}

#[async_trait]
impl PaymentGateway for MercadoPagoGateway {
    async fn get_payment(&self, payment_id: &PaymentId) -> Result<GatewayPayment, GatewayError> {
        let path = format!("/v1/payments/{}", payment_id);
        let response: PaymentResponse = self
            .send("get_payment", &path, self.http_client.get(self.url(&path)))
            .await?;
        Ok(response.into_payment())
    }

    async fn create_preference(
        &self,
        request: PreferenceRequest,
    ) -> Result<HostedCheckout, GatewayError> {
        let body = PreferenceBody::from_request(request, self.is_sandbox());
        let checkout = self
            .create_checkout("create_preference", "/checkout/preferences", &body)
            .await?;
        tracing::debug!(preference_id = %checkout.id, "Preference created");
        Ok(checkout)
    }

    async fn create_preapproval(
        &self,
        request: PreapprovalRequest,
    ) -> Result<HostedCheckout, GatewayError> {
        let body = PreapprovalBody::from(request);
        let checkout = self
            .create_checkout("create_preapproval", "/preapproval", &body)
            .await?;
        tracing::debug!(preapproval_id = %checkout.id, "Preapproval created");
        Ok(checkout)
    }

    async fn get_preapproval(
        &self,
        preapproval_id: &PreapprovalId,
    ) -> Result<GatewayPreapproval, GatewayError> {
        let path = format!("/preapproval/{}", preapproval_id);
        let response: PreapprovalResponse = self
            .send("get_preapproval", &path, self.http_client.get(self.url(&path)))
            .await?;
        Ok(response.into_preapproval())
    }

    async fn get_authorized_payment(
        &self,
        payment_id: &PaymentId,
    ) -> Result<GatewayAuthorizedPayment, GatewayError> {
        let path = format!("/authorized_payments/{}", payment_id);
        let response: AuthorizedPaymentResponse = self
            .send(
                "get_authorized_payment",
                &path,
                self.http_client.get(self.url(&path)),
            )
            .await?;
        Ok(response.into_authorized_payment())
    }

    fn is_sandbox(&self) -> bool {
        self.config.is_sandbox()
    }
}
