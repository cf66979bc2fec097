//! HTTP adapter for admin endpoints.

pub mod dto;
mod handlers;

use axum::routing::{delete, post, put};
use axum::Router;

use crate::adapters::http::state::AppState;

use handlers::{create_coupon, delete_user, override_access, reset_password, set_vip};

/// # Routes (authenticated, admin flag checked per request)
/// - `DELETE /admin/users/:id`
/// - `POST /admin/users/:id/password`
/// - `PUT /admin/users/:id/vip`
/// - `PUT /admin/access`
/// - `POST /admin/coupons`
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users/:id", delete(delete_user))
        .route("/admin/users/:id/password", post(reset_password))
        .route("/admin/users/:id/vip", put(set_vip))
        .route("/admin/access", put(override_access))
        .route("/admin/coupons", post(create_coupon))
}
