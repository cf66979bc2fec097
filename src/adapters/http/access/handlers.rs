//! HTTP handlers for the signed-in student's access endpoints.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::RequireAuth;
use crate::adapters::http::state::AppState;
use crate::application::handlers::access::{
    ActivateTrialCommand, CancelPendingCommand, CreateCheckoutCommand, GetAccessOverviewQuery,
};
use crate::application::handlers::subscription::CreateSubscriptionCommand;
use crate::application::handlers::HandlerError;
use crate::domain::foundation::{GroupNumber, SubjectId};
use crate::ports::PaymentMethod;

use super::dto::{
    AccessEntryResponse, AccessOverviewResponse, ActivateTrialRequest, CancelPendingResponse,
    CheckoutResponse, CreateCheckoutRequest, SubscriptionCheckoutResponse,
};

/// GET /api/access - The caller's entries and derived flags
pub async fn get_access_overview(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let overview = state
        .access_overview_handler()
        .handle(GetAccessOverviewQuery { user_id: user.id })
        .await?;

    Ok(Json(AccessOverviewResponse::from(overview)))
}

/// POST /api/access/trial - Start the caller's lifetime trial on one subject
pub async fn activate_trial(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<ActivateTrialRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = ActivateTrialCommand {
        user_id: user.id,
        subject_id: SubjectId::new(request.subject_id)?,
        group: GroupNumber::new(request.group)?,
    };

    let result = state.activate_trial_handler().handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(AccessEntryResponse::from(result.entry))))
}

/// POST /api/access/checkout - Start a hosted one-time checkout
pub async fn create_checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CreateCheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let subject_label = request.subject_label.trim().to_string();
    if subject_label.is_empty() {
        return Err(HandlerError::validation("subject_label", "must not be empty").into());
    }

    let cmd = CreateCheckoutCommand {
        user_id: user.id,
        subject_id: SubjectId::new(request.subject_id)?,
        subject_label,
        group: GroupNumber::new(request.group)?,
        method: request.payment_method.unwrap_or(PaymentMethod::Pix),
    };

    let result = state.create_checkout_handler().handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(CheckoutResponse::from(result))))
}

/// POST /api/access/:subject/cancel-pending - Back out of an unpaid checkout
pub async fn cancel_pending(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(subject): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CancelPendingCommand {
        user_id: user.id,
        subject_id: SubjectId::new(subject)?,
    };

    let result = state.cancel_pending_handler().handle(cmd).await?;

    Ok(Json(CancelPendingResponse::from(result.disposition)))
}

/// POST /api/subscriptions - Start a recurring preapproval checkout
pub async fn create_subscription(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .create_subscription_handler()
        .handle(CreateSubscriptionCommand { user })
        .await?;

    Ok((StatusCode::CREATED, Json(SubscriptionCheckoutResponse::from(result))))
}
