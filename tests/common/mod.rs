//! Shared fixture: the full axum application over in-memory adapters.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use rotation_access::adapters::auth::MockSessionValidator;
use rotation_access::adapters::http::{api_router, AppSettings, AppState};
use rotation_access::adapters::memory::{
    InMemoryAccessRepository, InMemoryCommissionLedger, InMemoryEventLog, InMemoryIdentityAdmin,
    InMemoryProfileRepository, InMemorySessionStore, InMemorySubscriptionRepository,
    InMemoryUserDataPurger, RecordingEmailSender,
};
use rotation_access::adapters::mercadopago::MockPaymentGateway;
use rotation_access::domain::access::AccessPolicy;
use rotation_access::domain::foundation::{ReferralCode, Timestamp, UserId};
use rotation_access::domain::settlement::sign_notification;
use rotation_access::ports::Profile;

pub const WEBHOOK_SECRET: &str = "integration-secret";
pub const STUDENT: &str = "student-1";
pub const STUDENT_TOKEN: &str = "student-token";
pub const ADMIN: &str = "admin-1";
pub const ADMIN_TOKEN: &str = "admin-token";

pub struct TestApp {
    pub router: Router,
    pub access: Arc<InMemoryAccessRepository>,
    pub subscriptions: Arc<InMemorySubscriptionRepository>,
    pub profiles: Arc<InMemoryProfileRepository>,
    pub commissions: Arc<InMemoryCommissionLedger>,
    pub sessions: Arc<InMemorySessionStore>,
    pub purger: Arc<InMemoryUserDataPurger>,
    pub events: Arc<InMemoryEventLog>,
    pub gateway: Arc<MockPaymentGateway>,
    pub emails: Arc<RecordingEmailSender>,
    pub identity: Arc<InMemoryIdentityAdmin>,
}

impl TestApp {
    pub async fn new() -> Self {
        let access = Arc::new(InMemoryAccessRepository::new());
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
        let profiles = Arc::new(InMemoryProfileRepository::new());
        let commissions = Arc::new(InMemoryCommissionLedger::new());
        let sessions = Arc::new(InMemorySessionStore::new());
        let purger = Arc::new(InMemoryUserDataPurger::new());
        let events = Arc::new(InMemoryEventLog::new());
        let gateway = Arc::new(MockPaymentGateway::new());
        let emails = Arc::new(RecordingEmailSender::new());
        let identity = Arc::new(InMemoryIdentityAdmin::new());

        let validator = MockSessionValidator::new()
            .with_test_user(STUDENT_TOKEN, STUDENT)
            .with_test_user(ADMIN_TOKEN, ADMIN);

        let settings = AppSettings {
            policy: AccessPolicy {
                module_end_date: Timestamp::now().add_days(30),
                ..AccessPolicy::default()
            },
            ..AppSettings::default()
        }
        .with_webhook_secret(WEBHOOK_SECRET);

        profiles.insert(profile(STUDENT, false)).await;
        profiles.insert(profile(ADMIN, true)).await;

        let state = AppState {
            access_repository: access.clone(),
            subscription_repository: subscriptions.clone(),
            profile_repository: profiles.clone(),
            commission_ledger: commissions.clone(),
            session_store: sessions.clone(),
            user_data_purger: purger.clone(),
            event_log: events.clone(),
            payment_gateway: gateway.clone(),
            email_sender: emails.clone(),
            identity_admin: identity.clone(),
            session_validator: Arc::new(validator),
            settings: Arc::new(settings),
        };

        Self {
            router: api_router(state),
            access,
            subscriptions,
            profiles,
            commissions,
            sessions,
            purger,
            events,
            gateway,
            emails,
            identity,
        }
    }

    /// Sends a request and returns the status with the JSON body (or `Null`).
    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, collect_json(response.into_body()).await)
    }

    /// Posts a correctly signed payment notification for `payment_id`.
    pub async fn notify_payment(&self, payment_id: &str) -> StatusCode {
        self.notify("payment", payment_id, true).await
    }

    pub async fn notify(&self, topic: &str, data_id: &str, signed: bool) -> StatusCode {
        let request_id = format!("req-{}", data_id);
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!(
                "/api/webhooks/mercadopago?type={}&data.id={}",
                topic, data_id
            ))
            .header("x-request-id", &request_id);
        if signed {
            let ts = Timestamp::now().as_datetime().timestamp_millis().to_string();
            builder = builder.header(
                "x-signature",
                sign_notification(WEBHOOK_SECRET, data_id, &request_id, &ts),
            );
        }
        let response = self
            .router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        response.status()
    }
}

pub fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

pub fn profile(id: &str, is_admin: bool) -> Profile {
    Profile {
        user_id: user(id),
        email: Some(format!("{}@example.com", id)),
        name: Some("Ana Souza".into()),
        referred_by: None,
        referral_code: None,
        is_admin,
        is_vip: false,
    }
}

pub fn affiliate_profile(id: &str, code: &str) -> Profile {
    Profile {
        referral_code: Some(ReferralCode::new(code).unwrap()),
        ..profile(id, false)
    }
}

pub fn referred_profile(id: &str, code: &str) -> Profile {
    Profile {
        referred_by: Some(ReferralCode::new(code).unwrap()),
        ..profile(id, false)
    }
}

/// Reads the whole body as JSON; empty or non-JSON bodies become `Null`.
pub async fn collect_json(body: Body) -> serde_json::Value {
    match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) if !bytes.is_empty() => {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        }
        _ => serde_json::Value::Null,
    }
}
