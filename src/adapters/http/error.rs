//! Error responses shared by every HTTP module.
//!
//! Every failure is rendered as
//! `{"error_code": "...", "message": "...", "details": {..}}` with `details`
//! omitted when empty.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::application::handlers::HandlerError;
use crate::domain::access::AccessError;
use crate::domain::foundation::{ErrorCode, ValidationError};

/// Standard error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error_code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// API error type that converts handler errors to HTTP responses.
#[derive(Debug)]
pub struct ApiError(HandlerError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            HandlerError::Access(err) => access_status(err),
            HandlerError::Validation { .. } => StatusCode::BAD_REQUEST,
            HandlerError::Forbidden => StatusCode::FORBIDDEN,
            HandlerError::NotFound(_) => StatusCode::NOT_FOUND,
            HandlerError::SubscriptionAlreadyActive => StatusCode::CONFLICT,
            HandlerError::Gateway(_) => StatusCode::BAD_GATEWAY,
            HandlerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_inner(self) -> HandlerError {
        self.0
    }
}

fn access_status(err: &AccessError) -> StatusCode {
    match err {
        AccessError::TrialAlreadyUsed(_)
        | AccessError::AlreadyHasAccess { .. }
        | AccessError::InvalidState { .. } => StatusCode::CONFLICT,
        AccessError::NotFound { .. } => StatusCode::NOT_FOUND,
        AccessError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
        AccessError::Conflict { .. } | AccessError::Infrastructure(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<HandlerError> for ApiError {
    fn from(err: HandlerError) -> Self {
        Self(err)
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        Self(HandlerError::Access(err))
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.0.code();

        let body = if status.is_server_error() && status != StatusCode::BAD_GATEWAY {
            tracing::error!(error = %self.0, "Request failed");
            ErrorResponse::new(code.to_string(), "Internal error, please try again")
        } else {
            let mut body = ErrorResponse::new(code.to_string(), self.0.to_string());
            if let Some(field) = validation_field(&self.0) {
                body = body.with_details(serde_json::json!({ "field": field }));
            }
            body
        };

        (status, Json(body)).into_response()
    }
}

fn validation_field(err: &HandlerError) -> Option<&str> {
    match err {
        HandlerError::Validation { field, .. }
        | HandlerError::Access(AccessError::ValidationFailed { field, .. }) => {
            Some(field.as_str()).filter(|f| !f.is_empty())
        }
        _ => None,
    }
}

/// Shorthand for a JSON error response outside the handler error path.
pub fn error_response(status: StatusCode, code: ErrorCode, message: &str) -> Response {
    (status, Json(ErrorResponse::new(code.to_string(), message))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{SubjectId, UserId};

    fn user() -> UserId {
        UserId::new("u1").unwrap()
    }

    #[test]
    fn trial_reuse_is_conflict() {
        let err = ApiError::from(AccessError::TrialAlreadyUsed(user()));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn approved_access_is_conflict() {
        let subject = SubjectId::new("ped").unwrap();
        let err = ApiError::from(AccessError::already_has_access(&user(), &subject));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn exhausted_retries_are_internal() {
        let subject = SubjectId::new("ped").unwrap();
        let err = ApiError::from(AccessError::conflict(&user(), &subject));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn handler_statuses() {
        let cases = [
            (HandlerError::Forbidden, StatusCode::FORBIDDEN),
            (HandlerError::SubscriptionAlreadyActive, StatusCode::CONFLICT),
            (HandlerError::Gateway("down".into()), StatusCode::BAD_GATEWAY),
            (HandlerError::Storage("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (HandlerError::validation("group", "bad"), StatusCode::BAD_REQUEST),
            (HandlerError::NotFound("Profile".into()), StatusCode::NOT_FOUND),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn error_response_omits_empty_details() {
        let json = serde_json::to_value(ErrorResponse::new("FORBIDDEN", "no")).unwrap();
        assert!(json.get("details").is_none());
        assert_eq!(json["error_code"], "FORBIDDEN");
    }

    #[test]
    fn validation_response_names_the_field() {
        let response = ApiError::from(HandlerError::validation("password", "too short"))
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
