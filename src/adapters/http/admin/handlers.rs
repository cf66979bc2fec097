//! HTTP handlers for admin endpoints.
//!
//! The admin check happens in the application handlers against the profile
//! row; these only parse and shape.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::adapters::http::access::dto::AccessEntryResponse;
use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::RequireAuth;
use crate::adapters::http::state::AppState;
use crate::application::handlers::access::CreateCouponCheckoutCommand;
use crate::application::handlers::admin::{
    DeleteUserCommand, OverrideAccessCommand, ResetPasswordCommand, SetVipCommand,
};
use crate::domain::foundation::{GroupNumber, SubjectId, UserId};

use super::dto::{
    CouponResponse, CreateCouponRequest, DeleteUserResponse, OverrideAccessRequest,
    ResetPasswordRequest, SetVipRequest,
};

/// DELETE /api/admin/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAuth(admin): RequireAuth,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .delete_user_handler()
        .handle(DeleteUserCommand {
            admin_id: admin.id,
            target_user_id: UserId::new(user_id)?,
        })
        .await?;

    Ok(Json(DeleteUserResponse::from(report)))
}

/// POST /api/admin/users/:id/password
pub async fn reset_password(
    State(state): State<AppState>,
    RequireAuth(admin): RequireAuth,
    Path(user_id): Path<String>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .reset_password_handler()
        .handle(ResetPasswordCommand {
            admin_id: admin.id,
            target_user_id: UserId::new(user_id)?,
            new_password: request.password,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/admin/users/:id/vip
pub async fn set_vip(
    State(state): State<AppState>,
    RequireAuth(admin): RequireAuth,
    Path(user_id): Path<String>,
    Json(request): Json<SetVipRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .set_vip_handler()
        .handle(SetVipCommand {
            admin_id: admin.id,
            target_user_id: UserId::new(user_id)?,
            is_vip: request.is_vip,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/admin/access
pub async fn override_access(
    State(state): State<AppState>,
    RequireAuth(admin): RequireAuth,
    Json(request): Json<OverrideAccessRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state
        .override_access_handler()
        .handle(OverrideAccessCommand {
            admin_id: admin.id,
            target_user_id: UserId::new(request.user_id)?,
            subject_id: SubjectId::new(request.subject_id)?,
            status: request.status,
            group: GroupNumber::new(request.group)?,
        })
        .await?;

    Ok(Json(AccessEntryResponse::from(entry)))
}

/// POST /api/admin/coupons - Discounted PIX link for a user on trial
pub async fn create_coupon(
    State(state): State<AppState>,
    RequireAuth(admin): RequireAuth,
    Json(request): Json<CreateCouponRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .coupon_checkout_handler()
        .handle(CreateCouponCheckoutCommand {
            admin_id: admin.id,
            target_user_id: UserId::new(request.user_id)?,
            subject_id: SubjectId::new(request.subject_id)?,
            subject_label: request.subject_label,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CouponResponse::from(result))))
}
