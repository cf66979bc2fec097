//! Shared application state for the HTTP adapter.
//!
//! Holds the ports as trait objects plus the settings every handler needs.
//! Handlers are built on demand per request; building one only clones
//! `Arc`s and small value types.

use std::sync::Arc;

use secrecy::SecretString;

use crate::application::handlers::access::{
    ActivateTrialHandler, CancelPendingHandler, CreateCheckoutHandler,
    CreateCouponCheckoutHandler, GetAccessOverviewHandler,
};
use crate::application::handlers::admin::{
    DeleteUserHandler, OverrideAccessHandler, ResetPasswordHandler, SetVipHandler,
};
use crate::application::handlers::session::{
    EndSessionHandler, HeartbeatHandler, RegisterSessionHandler,
};
use crate::application::handlers::settlement::{
    CommissionCrediting, HandleNotificationHandler, ProcessAuthorizedPaymentHandler,
    ProcessPaymentHandler, ProcessPreapprovalHandler,
};
use crate::application::handlers::subscription::CreateSubscriptionHandler;
use crate::application::handlers::{CheckoutLinks, EventRecorder};
use crate::config::{AppConfig, ValidationError};
use crate::domain::access::{AccessLedger, AccessPolicy, Pricing};
use crate::domain::session::{SessionGuard, MAX_SESSIONS, STALE_AFTER_MINUTES};
use crate::domain::settlement::{AmountFloor, SignatureVerifier};
use crate::ports::{
    AccessRepository, CommissionLedger, EmailSender, EventLog, IdentityAdmin, PaymentGateway,
    ProfileRepository, SessionStore, SessionValidator, SubscriptionRepository, UserDataPurger,
};

/// Business settings resolved from configuration once at startup.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub policy: AccessPolicy,
    pub pricing: Pricing,
    pub floor: AmountFloor,
    pub links: CheckoutLinks,
    pub webhook_secret: SecretString,
    pub admin_alert_email: Option<String>,
    pub max_sessions: usize,
    pub session_stale_minutes: i64,
}

impl AppSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, ValidationError> {
        Ok(Self {
            policy: config.access.policy()?,
            pricing: config.pricing.pricing()?,
            floor: config.pricing.amount_floor()?,
            links: CheckoutLinks::new(
                config.server.app_url.clone(),
                config.server.notification_url(),
            ),
            webhook_secret: config.payment.webhook_secret.clone(),
            admin_alert_email: config.email.admin_alert_email.clone(),
            max_sessions: config.access.max_sessions,
            session_stale_minutes: config.access.session_stale_minutes,
        })
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = SecretString::new(secret.into());
        self
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            policy: AccessPolicy::default(),
            pricing: Pricing::default(),
            floor: AmountFloor::default(),
            links: CheckoutLinks::new(
                "http://localhost:5173",
                "http://localhost:8080/api/webhooks/mercadopago",
            ),
            webhook_secret: SecretString::new(String::new()),
            admin_alert_email: None,
            max_sessions: MAX_SESSIONS,
            session_stale_minutes: STALE_AFTER_MINUTES,
        }
    }
}

/// Shared application state containing all dependencies.
#[derive(Clone)]
pub struct AppState {
    pub access_repository: Arc<dyn AccessRepository>,
    pub subscription_repository: Arc<dyn SubscriptionRepository>,
    pub profile_repository: Arc<dyn ProfileRepository>,
    pub commission_ledger: Arc<dyn CommissionLedger>,
    pub session_store: Arc<dyn SessionStore>,
    pub user_data_purger: Arc<dyn UserDataPurger>,
    pub event_log: Arc<dyn EventLog>,
    pub payment_gateway: Arc<dyn PaymentGateway>,
    pub email_sender: Arc<dyn EmailSender>,
    pub identity_admin: Arc<dyn IdentityAdmin>,
    pub session_validator: Arc<dyn SessionValidator>,
    pub settings: Arc<AppSettings>,
}

impl AppState {
    // ════════════════════════════════════════════════════════════════════════════
    // Shared services
    // ════════════════════════════════════════════════════════════════════════════

    pub fn ledger(&self) -> Arc<AccessLedger> {
        Arc::new(AccessLedger::new(
            self.access_repository.clone(),
            self.settings.policy.clone(),
        ))
    }

    pub fn recorder(&self) -> Arc<EventRecorder> {
        Arc::new(EventRecorder::new(
            self.event_log.clone(),
            self.email_sender.clone(),
            self.settings.admin_alert_email.clone(),
        ))
    }

    fn session_guard(&self) -> Arc<SessionGuard> {
        Arc::new(SessionGuard::with_limits(
            self.session_store.clone(),
            self.settings.max_sessions,
            self.settings.session_stale_minutes,
        ))
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Access and subscription handlers
    // ════════════════════════════════════════════════════════════════════════════

    pub fn access_overview_handler(&self) -> GetAccessOverviewHandler {
        GetAccessOverviewHandler::new(
            self.ledger(),
            self.subscription_repository.clone(),
            self.profile_repository.clone(),
        )
    }

    pub fn activate_trial_handler(&self) -> ActivateTrialHandler {
        ActivateTrialHandler::new(self.ledger(), self.recorder())
    }

    pub fn cancel_pending_handler(&self) -> CancelPendingHandler {
        CancelPendingHandler::new(self.ledger(), self.recorder())
    }

    pub fn create_checkout_handler(&self) -> CreateCheckoutHandler {
        CreateCheckoutHandler::new(
            self.ledger(),
            self.profile_repository.clone(),
            self.payment_gateway.clone(),
            self.recorder(),
            self.settings.pricing.clone(),
            self.settings.links.clone(),
        )
    }

    pub fn create_subscription_handler(&self) -> CreateSubscriptionHandler {
        CreateSubscriptionHandler::new(
            self.subscription_repository.clone(),
            self.profile_repository.clone(),
            self.payment_gateway.clone(),
            self.recorder(),
            self.settings.pricing.clone(),
            self.settings.links.clone(),
        )
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Session handlers
    // ════════════════════════════════════════════════════════════════════════════

    pub fn register_session_handler(&self) -> RegisterSessionHandler {
        RegisterSessionHandler::new(self.session_guard())
    }

    pub fn heartbeat_handler(&self) -> HeartbeatHandler {
        HeartbeatHandler::new(self.session_guard())
    }

    pub fn end_session_handler(&self) -> EndSessionHandler {
        EndSessionHandler::new(self.session_guard())
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Admin handlers
    // ════════════════════════════════════════════════════════════════════════════

    pub fn delete_user_handler(&self) -> DeleteUserHandler {
        DeleteUserHandler::new(
            self.profile_repository.clone(),
            self.user_data_purger.clone(),
            self.identity_admin.clone(),
        )
    }

    pub fn reset_password_handler(&self) -> ResetPasswordHandler {
        ResetPasswordHandler::new(self.profile_repository.clone(), self.identity_admin.clone())
    }

    pub fn set_vip_handler(&self) -> SetVipHandler {
        SetVipHandler::new(self.profile_repository.clone(), self.recorder())
    }

    pub fn override_access_handler(&self) -> OverrideAccessHandler {
        OverrideAccessHandler::new(self.ledger(), self.profile_repository.clone(), self.recorder())
    }

    pub fn coupon_checkout_handler(&self) -> CreateCouponCheckoutHandler {
        CreateCouponCheckoutHandler::new(
            self.ledger(),
            self.profile_repository.clone(),
            self.payment_gateway.clone(),
            self.recorder(),
            self.settings.pricing.clone(),
            self.settings.links.clone(),
        )
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Settlement
    // ════════════════════════════════════════════════════════════════════════════

    pub fn notification_handler(&self) -> HandleNotificationHandler {
        let recorder = self.recorder();
        let commissions = Arc::new(CommissionCrediting::new(
            self.profile_repository.clone(),
            self.commission_ledger.clone(),
            recorder.clone(),
        ));
        let payments = ProcessPaymentHandler::new(
            self.payment_gateway.clone(),
            self.ledger(),
            self.profile_repository.clone(),
            commissions,
            self.email_sender.clone(),
            recorder.clone(),
            self.settings.floor,
            self.settings.links.app_url.clone(),
        );
        let preapprovals = ProcessPreapprovalHandler::new(
            self.payment_gateway.clone(),
            self.subscription_repository.clone(),
            recorder.clone(),
            self.settings.policy.clone(),
        );
        let authorized_payments = ProcessAuthorizedPaymentHandler::new(
            self.payment_gateway.clone(),
            self.subscription_repository.clone(),
            recorder,
            self.settings.policy.clone(),
        );

        HandleNotificationHandler::new(
            Arc::new(SignatureVerifier::new(self.settings.webhook_secret.clone())),
            Arc::new(payments),
            Arc::new(preapprovals),
            Arc::new(authorized_payments),
        )
    }
}
