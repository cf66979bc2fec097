//! CreateCouponCheckoutHandler - Admin-issued discounted PIX checkout.
//!
//! Support uses this to send a trial user a fixed-price link. The link is
//! PIX only and expires after `Pricing::coupon_validity_days`.

use std::sync::Arc;

use crate::application::handlers::admin::require_admin;
use crate::application::handlers::{CheckoutLinks, EventRecorder, HandlerError};
use crate::domain::access::{AccessLedger, AccessStatus, Pricing, PurchaseReference};
use crate::domain::foundation::{Money, SubjectId, Timestamp, UserId};
use crate::domain::settlement::AccessEvent;
use crate::ports::{PaymentGateway, PaymentMethod, PreferenceRequest, ProfileRepository};

#[derive(Debug, Clone)]
pub struct CreateCouponCheckoutCommand {
    pub admin_id: UserId,
    pub target_user_id: UserId,
    pub subject_id: SubjectId,
    pub subject_label: String,
}

#[derive(Debug, Clone)]
pub struct CreateCouponCheckoutResult {
    pub checkout_url: String,
    pub price: Money,
    pub expires_at: Timestamp,
}

pub struct CreateCouponCheckoutHandler {
    ledger: Arc<AccessLedger>,
    profiles: Arc<dyn ProfileRepository>,
    gateway: Arc<dyn PaymentGateway>,
    recorder: Arc<EventRecorder>,
    pricing: Pricing,
    links: CheckoutLinks,
}

impl CreateCouponCheckoutHandler {
    pub fn new(
        ledger: Arc<AccessLedger>,
        profiles: Arc<dyn ProfileRepository>,
        gateway: Arc<dyn PaymentGateway>,
        recorder: Arc<EventRecorder>,
        pricing: Pricing,
        links: CheckoutLinks,
    ) -> Self {
        Self {
            ledger,
            profiles,
            gateway,
            recorder,
            pricing,
            links,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateCouponCheckoutCommand,
    ) -> Result<CreateCouponCheckoutResult, HandlerError> {
        let now = Timestamp::now();

        // 1. Admins only
        require_admin(self.profiles.as_ref(), &cmd.admin_id).await?;

        // 2. Coupons are for users currently holding a trial on the subject
        let entry = self
            .ledger
            .get_access(&cmd.target_user_id, &cmd.subject_id)
            .await?
            .filter(|e| e.status == AccessStatus::Trial)
            .ok_or_else(|| {
                HandlerError::validation("subject_id", "user has no trial entry for this subject")
            })?;

        // 3. Pending before the link exists
        self.ledger
            .mark_pending(&cmd.target_user_id, &cmd.subject_id, None, None, now)
            .await?;

        // 4. PIX-only preference with an expiry
        let reference = PurchaseReference::new(
            cmd.target_user_id.clone(),
            cmd.subject_id.clone(),
            entry.group,
        )
        .to_string();
        let expires_at = now.add_days(self.pricing.coupon_validity_days);
        let price = self.pricing.coupon;
        let checkout = self
            .gateway
            .create_preference(PreferenceRequest {
                title: format!(
                    "Cronograma - {} Grupo {} (PIX)",
                    cmd.subject_label.trim(),
                    entry.group
                ),
                unit_price: price,
                currency: self.pricing.currency.clone(),
                external_reference: reference.clone(),
                method: PaymentMethod::Pix,
                back_urls: self.links.back_urls(&reference)?,
                notification_url: self.links.notification_url.clone(),
                expires_at: Some(expires_at),
            })
            .await?;

        self.recorder
            .record(
                Some(&cmd.target_user_id),
                AccessEvent::CheckoutCreated {
                    subject_id: cmd.subject_id.clone(),
                    group: entry.group,
                    payment_method: "coupon".to_string(),
                    price,
                    preference_id: checkout.id.clone(),
                },
                now,
            )
            .await;

        tracing::info!(
            admin_id = %cmd.admin_id,
            user_id = %cmd.target_user_id,
            subject_id = %cmd.subject_id,
            price = %price,
            "Coupon checkout created"
        );

        Ok(CreateCouponCheckoutResult {
            checkout_url: checkout.checkout_url(self.gateway.is_sandbox()).to_string(),
            price,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryAccessRepository, InMemoryEventLog, InMemoryProfileRepository,
        RecordingEmailSender,
    };
    use crate::adapters::mercadopago::MockPaymentGateway;
    use crate::domain::access::AccessPolicy;
    use crate::domain::foundation::GroupNumber;
    use crate::ports::Profile;

    struct Fixture {
        handler: CreateCouponCheckoutHandler,
        ledger: Arc<AccessLedger>,
        gateway: Arc<MockPaymentGateway>,
    }

    async fn fixture() -> Fixture {
        let ledger = Arc::new(AccessLedger::new(
            Arc::new(InMemoryAccessRepository::new()),
            AccessPolicy::default(),
        ));
        let profiles = Arc::new(InMemoryProfileRepository::new());
        profiles
            .insert(Profile {
                user_id: UserId::new("admin").unwrap(),
                email: None,
                name: None,
                referred_by: None,
                referral_code: None,
                is_admin: true,
                is_vip: false,
            })
            .await;
        let gateway = Arc::new(MockPaymentGateway::new());
        let recorder = Arc::new(EventRecorder::new(
            Arc::new(InMemoryEventLog::new()),
            Arc::new(RecordingEmailSender::new()),
            None,
        ));
        Fixture {
            handler: CreateCouponCheckoutHandler::new(
                ledger.clone(),
                profiles,
                gateway.clone(),
                recorder,
                Pricing::default(),
                CheckoutLinks::new("https://app.example.com/", "https://api.example.com/hook"),
            ),
            ledger,
            gateway,
        }
    }

    fn command(admin: &str) -> CreateCouponCheckoutCommand {
        CreateCouponCheckoutCommand {
            admin_id: UserId::new(admin).unwrap(),
            target_user_id: UserId::new("student").unwrap(),
            subject_id: SubjectId::new("ped").unwrap(),
            subject_label: "Pediatria".into(),
        }
    }

    async fn give_trial(f: &Fixture) {
        f.ledger
            .activate_trial(
                &UserId::new("student").unwrap(),
                &SubjectId::new("ped").unwrap(),
                GroupNumber::new(4).unwrap(),
                Timestamp::now(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn creates_expiring_pix_coupon_for_trial_user() {
        let f = fixture().await;
        give_trial(&f).await;

        let result = f.handler.handle(command("admin")).await.unwrap();

        assert_eq!(result.price.cents(), 1690);
        let prefs = f.gateway.preferences();
        assert_eq!(prefs[0].method, PaymentMethod::Pix);
        assert_eq!(prefs[0].external_reference, "student|ped|4");
        assert!(prefs[0].expires_at.is_some());
        let entry = f
            .ledger
            .get_access(&UserId::new("student").unwrap(), &SubjectId::new("ped").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.status, AccessStatus::Pending);
    }

    #[tokio::test]
    async fn non_admin_is_forbidden() {
        let f = fixture().await;
        give_trial(&f).await;

        let err = f.handler.handle(command("student")).await.unwrap_err();

        assert_eq!(err, HandlerError::Forbidden);
        assert!(f.gateway.preferences().is_empty());
    }

    #[tokio::test]
    async fn user_without_trial_is_rejected() {
        let f = fixture().await;

        let err = f.handler.handle(command("admin")).await.unwrap_err();

        assert!(matches!(err, HandlerError::Validation { .. }));
    }
}
