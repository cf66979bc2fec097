//! Webhook error types for gateway notification handling.
//!
//! Status codes drive the gateway's redelivery: 2xx and 4xx are final,
//! 5xx and 502 are retried later.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::access::{AccessError, ReferenceError};
use crate::domain::foundation::{DomainError, Money};

#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature missing, malformed or not matching.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Payment id is not a run of digits.
    #[error("Invalid payment id: {0}")]
    InvalidPaymentId(String),

    /// External reference could not be parsed.
    #[error("Invalid external reference: {0}")]
    InvalidReference(#[from] ReferenceError),

    /// Approved payment below the floor price.
    #[error("Suspicious amount {amount:?} for payment {payment_id} (floor {floor})")]
    SuspiciousAmount {
        payment_id: String,
        amount: Option<Money>,
        floor: Money,
    },

    /// Gateway lookup failed or timed out.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Primary state transition could not be stored.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Returns true if the gateway should redeliver this notification.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Gateway(_) | WebhookError::Database(_))
    }

    /// Security-relevant rejections, logged as potential attacks.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            WebhookError::InvalidSignature | WebhookError::SuspiciousAmount { .. }
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,

            WebhookError::InvalidPaymentId(_)
            | WebhookError::InvalidReference(_)
            | WebhookError::SuspiciousAmount { .. } => StatusCode::BAD_REQUEST,

            WebhookError::Gateway(_) => StatusCode::BAD_GATEWAY,

            WebhookError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Database(err.to_string())
    }
}

impl From<AccessError> for WebhookError {
    fn from(err: AccessError) -> Self {
        WebhookError::Database(err.to_string())
    }
}
