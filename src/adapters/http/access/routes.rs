//! Axum router configuration for access and subscription endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use crate::adapters::http::state::AppState;

use super::handlers::{
    activate_trial, cancel_pending, create_checkout, create_subscription, get_access_overview,
};

/// # Routes (all require authentication)
/// - `GET /access` - Entries, trial usage, subscriber and VIP flags
/// - `POST /access/trial` - Activate the lifetime trial
/// - `POST /access/checkout` - Start a one-time checkout
/// - `POST /access/:subject/cancel-pending` - Abandon a pending checkout
/// - `POST /subscriptions` - Start a subscription checkout
pub fn access_routes() -> Router<AppState> {
    Router::new()
        .route("/access", get(get_access_overview))
        .route("/access/trial", post(activate_trial))
        .route("/access/checkout", post(create_checkout))
        .route("/access/:subject/cancel-pending", post(cancel_pending))
        .route("/subscriptions", post(create_subscription))
}
