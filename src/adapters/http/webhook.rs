//! Gateway notification endpoint.
//!
//! No bearer auth: the request is authenticated by its `x-signature`
//! header inside the settlement handler. Status codes drive redelivery,
//! so every handled or ignored notification answers `200 ok`.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};

use crate::adapters::http::error::ErrorResponse;
use crate::adapters::http::state::AppState;
use crate::application::handlers::settlement::HandleNotificationCommand;
use crate::config::NOTIFICATION_PATH;
use crate::domain::foundation::ErrorCode;
use crate::domain::settlement::WebhookError;

pub const SIGNATURE_HEADER: &str = "x-signature";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// POST /api/webhooks/mercadopago
pub async fn receive_notification(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let cmd = HandleNotificationCommand {
        query,
        body: body.to_vec(),
        signature: header_value(&headers, SIGNATURE_HEADER),
        request_id: header_value(&headers, REQUEST_ID_HEADER),
    };

    let outcome = state.notification_handler().handle(cmd).await?;
    tracing::debug!(outcome = ?outcome, "Notification processed");

    Ok((StatusCode::OK, "ok"))
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn webhook_routes() -> Router<AppState> {
    Router::new().route(NOTIFICATION_PATH, post(receive_notification))
}

/// Renders settlement failures with the status the gateway expects.
#[derive(Debug)]
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

fn error_code(err: &WebhookError) -> ErrorCode {
    match err {
        WebhookError::InvalidSignature => ErrorCode::InvalidSignature,
        WebhookError::InvalidPaymentId(_) => ErrorCode::ValidationFailed,
        WebhookError::InvalidReference(_) => ErrorCode::InvalidReference,
        WebhookError::SuspiciousAmount { .. } => ErrorCode::SuspiciousAmount,
        WebhookError::Gateway(_) => ErrorCode::GatewayError,
        WebhookError::Database(_) => ErrorCode::DatabaseError,
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if self.0.is_retryable() {
            tracing::error!(error = %self.0, status = status.as_u16(), "Notification failed, gateway will retry");
        } else if self.0.is_integrity_failure() {
            tracing::warn!(error = %self.0, "Notification rejected");
        }

        // Integrity rejections say as little as possible to the caller.
        let message = if self.0.is_integrity_failure() || self.0.is_retryable() {
            status.canonical_reason().unwrap_or("error").to_string()
        } else {
            self.0.to_string()
        };
        let body = ErrorResponse::new(error_code(&self.0).to_string(), message);
        (status, Json(body)).into_response()
    }
}
