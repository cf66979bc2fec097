//! HTTP adapter for login admission, heartbeat and logout.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::RequireAuth;
use crate::adapters::http::state::AppState;
use crate::application::handlers::session::{
    EndSessionCommand, HeartbeatCommand, RegisterSessionCommand,
};

// ════════════════════════════════════════════════════════════════════════════════
// DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterSessionRequest {
    #[serde(default)]
    pub device_info: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeartbeatRequest {
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeartbeatResponse {
    /// False once a newer login evicted this session; the client signs out.
    pub valid: bool,
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/sessions - Admit this login, evicting older sessions
pub async fn register_session(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    request: Option<Json<RegisterSessionRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let result = state
        .register_session_handler()
        .handle(RegisterSessionCommand {
            user_id: user.id,
            device_info: request.device_info,
        })
        .await?;

    let response = SessionResponse {
        token: result.session.token,
        created_at: result.session.created_at.to_rfc3339(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/sessions/heartbeat - Refresh this session's last-seen time
pub async fn heartbeat(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<HeartbeatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .heartbeat_handler()
        .handle(HeartbeatCommand {
            user_id: user.id,
            token: request.token,
        })
        .await?;

    Ok(Json(HeartbeatResponse { valid: result.valid }))
}

/// DELETE /api/sessions/:token - Log out
pub async fn end_session(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .end_session_handler()
        .handle(EndSessionCommand {
            user_id: user.id,
            token,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// # Routes (all require authentication)
/// - `POST /sessions`
/// - `POST /sessions/heartbeat`
/// - `DELETE /sessions/:token`
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(register_session))
        .route("/sessions/heartbeat", post(heartbeat))
        .route("/sessions/:token", delete(end_session))
}
