//! Access ledger error types.
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | TrialAlreadyUsed | 409 |
//! | AlreadyHasAccess | 409 |
//! | NotFound | 404 |
//! | InvalidState | 409 |
//! | Conflict | 500 (retry) |
//! | ValidationFailed | 400 |
//! | Infrastructure | 500 |

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, SubjectId, UserId, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("User {0} has already used their trial")]
    TrialAlreadyUsed(UserId),

    #[error("User {user_id} already has access to {subject_id}")]
    AlreadyHasAccess { user_id: UserId, subject_id: SubjectId },

    #[error("No access entry for user {user_id} and subject {subject_id}")]
    NotFound { user_id: UserId, subject_id: SubjectId },

    #[error("Cannot {attempted} access in status {current}")]
    InvalidState { current: String, attempted: String },

    #[error("Access entry for {user_id}/{subject_id} kept changing concurrently")]
    Conflict { user_id: UserId, subject_id: SubjectId },

    #[error("Validation failed for {field}: {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl AccessError {
    pub fn already_has_access(user_id: &UserId, subject_id: &SubjectId) -> Self {
        AccessError::AlreadyHasAccess {
            user_id: user_id.clone(),
            subject_id: subject_id.clone(),
        }
    }

    pub fn not_found(user_id: &UserId, subject_id: &SubjectId) -> Self {
        AccessError::NotFound {
            user_id: user_id.clone(),
            subject_id: subject_id.clone(),
        }
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        AccessError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn conflict(user_id: &UserId, subject_id: &SubjectId) -> Self {
        AccessError::Conflict {
            user_id: user_id.clone(),
            subject_id: subject_id.clone(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AccessError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        AccessError::Infrastructure(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AccessError::TrialAlreadyUsed(_) => ErrorCode::TrialAlreadyUsed,
            AccessError::AlreadyHasAccess { .. } => ErrorCode::AlreadyHasAccess,
            AccessError::NotFound { .. } => ErrorCode::AccessNotFound,
            AccessError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            AccessError::Conflict { .. } => ErrorCode::ConcurrentModification,
            AccessError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            AccessError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// True when the same request may succeed if repeated later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AccessError::Conflict { .. } | AccessError::Infrastructure(_))
    }
}

impl From<DomainError> for AccessError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed => AccessError::ValidationFailed {
                field: err.details.get("field").cloned().unwrap_or_default(),
                message: err.message,
            },
            ErrorCode::InvalidStateTransition => AccessError::InvalidState {
                current: err.details.get("current").cloned().unwrap_or_default(),
                attempted: err.message,
            },
            _ => AccessError::Infrastructure(err.to_string()),
        }
    }
}

impl From<ValidationError> for AccessError {
    fn from(err: ValidationError) -> Self {
        DomainError::from(err).into()
    }
}
