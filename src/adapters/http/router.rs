//! Top-level axum router and the tower-http stack around it.
//!
//! ```text
//! /health                         open
//! /api/webhooks/mercadopago       signature verified in the handler
//! /api/access/..., /api/subscriptions,
//! /api/sessions/..., /api/admin/...   bearer token (auth_middleware)
//! ```

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Request};
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::access::access_routes;
use super::admin::admin_routes;
use super::middleware::{auth_middleware, AuthState};
use super::session::session_routes;
use super::state::AppState;
use super::webhook::{webhook_routes, REQUEST_ID_HEADER};

/// Outer-layer settings taken from `ServerConfig`.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub request_timeout: Duration,
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            cors_origins: Vec::new(),
        }
    }
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Routes without the outer tower-http layers.
pub fn api_router(state: AppState) -> Router {
    let validator: AuthState = state.session_validator.clone();

    let authenticated = Router::new()
        .merge(access_routes())
        .merge(session_routes())
        .merge(admin_routes())
        .route_layer(from_fn_with_state(validator, auth_middleware));

    Router::new()
        .route("/health", get(health))
        .nest("/api", authenticated)
        .merge(webhook_routes())
        .with_state(state)
}

/// The full application: routes plus request ids, tracing, CORS,
/// compression and the request timeout.
pub fn app(state: AppState, options: &HttpOptions) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        tracing::info_span!(
            "http",
            method = %request.method(),
            path = %request.uri().path(),
            request_id,
        )
    });

    api_router(state).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(trace)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(cors_layer(&options.cors_origins))
            .layer(CompressionLayer::new())
            .layer(TimeoutLayer::new(options.request_timeout)),
    )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(allowed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::http::StatusCode;
    use tower::ServiceExt;

    use crate::adapters::auth::MockSessionValidator;
    use crate::adapters::http::state::AppSettings;
    use crate::adapters::memory::{
        InMemoryAccessRepository, InMemoryCommissionLedger, InMemoryEventLog,
        InMemoryIdentityAdmin, InMemoryProfileRepository, InMemorySessionStore,
        InMemorySubscriptionRepository, InMemoryUserDataPurger, RecordingEmailSender,
    };
    use crate::adapters::mercadopago::MockPaymentGateway;

    fn test_state() -> AppState {
        AppState {
            access_repository: Arc::new(InMemoryAccessRepository::new()),
            subscription_repository: Arc::new(InMemorySubscriptionRepository::new()),
            profile_repository: Arc::new(InMemoryProfileRepository::new()),
            commission_ledger: Arc::new(InMemoryCommissionLedger::new()),
            session_store: Arc::new(InMemorySessionStore::new()),
            user_data_purger: Arc::new(InMemoryUserDataPurger::new()),
            event_log: Arc::new(InMemoryEventLog::new()),
            payment_gateway: Arc::new(MockPaymentGateway::new()),
            email_sender: Arc::new(RecordingEmailSender::new()),
            identity_admin: Arc::new(InMemoryIdentityAdmin::new()),
            session_validator: Arc::new(MockSessionValidator::new()),
            settings: Arc::new(AppSettings::default()),
        }
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_open() {
        let response = api_router(test_state())
            .oneshot(request("GET", "/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn access_requires_auth() {
        let response = api_router(test_state())
            .oneshot(request("GET", "/api/access"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_route_is_404_not_401() {
        let response = api_router(test_state())
            .oneshot(request("GET", "/api/nope"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn full_app_sets_request_id() {
        let response = app(test_state(), &HttpOptions::default())
            .oneshot(request("GET", "/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn unsigned_notification_is_rejected() {
        let response = api_router(test_state())
            .oneshot(request(
                "POST",
                "/api/webhooks/mercadopago?type=payment&data.id=123",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn irrelevant_topic_is_ok() {
        let response = api_router(test_state())
            .oneshot(request("POST", "/api/webhooks/mercadopago?topic=merchant_order&id=9"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn cors_skips_bad_origins() {
        let _ = cors_layer(&["https://app.example.com".into(), "bad\norigin".into()]);
    }
}
