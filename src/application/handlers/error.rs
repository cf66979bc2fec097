//! Error type shared by the user-facing and admin command handlers.
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | Access(..) | per `AccessError` |
//! | Validation | 400 |
//! | Forbidden | 403 |
//! | NotFound | 404 |
//! | SubscriptionAlreadyActive | 409 |
//! | Gateway | 502 |
//! | Storage | 500 |

use thiserror::Error;

use crate::domain::access::AccessError;
use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};
use crate::ports::GatewayError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("Validation failed for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Admin privileges required")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(String),

    #[error("User already has an authorized subscription")]
    SubscriptionAlreadyActive,

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl HandlerError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        HandlerError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            HandlerError::Access(err) => err.code(),
            HandlerError::Validation { .. } => ErrorCode::ValidationFailed,
            HandlerError::Forbidden => ErrorCode::Forbidden,
            HandlerError::NotFound(_) => ErrorCode::ProfileNotFound,
            HandlerError::SubscriptionAlreadyActive => ErrorCode::SubscriptionAlreadyActive,
            HandlerError::Gateway(_) => ErrorCode::GatewayError,
            HandlerError::Storage(_) => ErrorCode::DatabaseError,
        }
    }
}

impl From<GatewayError> for HandlerError {
    fn from(err: GatewayError) -> Self {
        HandlerError::Gateway(err.to_string())
    }
}

impl From<ValidationError> for HandlerError {
    fn from(err: ValidationError) -> Self {
        HandlerError::Access(err.into())
    }
}

impl From<DomainError> for HandlerError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed => HandlerError::Validation {
                field: err.details.get("field").cloned().unwrap_or_default(),
                message: err.message,
            },
            ErrorCode::GatewayError => HandlerError::Gateway(err.message),
            _ => HandlerError::Storage(err.to_string()),
        }
    }
}
