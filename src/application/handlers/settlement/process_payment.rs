//! ProcessPaymentHandler - Settles one-time purchase notifications.
//!
//! The notification only names a payment id. Status, amount and external
//! reference are always fetched from the gateway before anything is trusted.
//!
//! Order of effects for an approved payment:
//! 1. idempotency check against the ledger
//! 2. amount floor
//! 3. ledger transition to approved (the only step whose failure is returned)
//! 4. `payment_success` event, commission, confirmation email (best effort)

use std::sync::Arc;

use crate::application::handlers::EventRecorder;
use crate::domain::access::{AccessLedger, ConfirmOutcome, PurchaseReference};
use crate::domain::foundation::{Money, PaymentId, Timestamp};
use crate::domain::settlement::{AccessEvent, AmountFloor, PaymentDisposition, WebhookError};
use crate::ports::{EmailSender, GatewayPayment, PaymentGateway, ProfileRepository};

use super::commission::CommissionCrediting;
use super::confirmation_email::confirmation_email;
use super::SettlementOutcome;

#[derive(Debug, Clone)]
pub struct ProcessPaymentCommand {
    pub payment_id: PaymentId,
}

pub struct ProcessPaymentHandler {
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<AccessLedger>,
    profiles: Arc<dyn ProfileRepository>,
    commissions: Arc<CommissionCrediting>,
    email_sender: Arc<dyn EmailSender>,
    recorder: Arc<EventRecorder>,
    floor: AmountFloor,
    app_url: String,
}

impl ProcessPaymentHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        ledger: Arc<AccessLedger>,
        profiles: Arc<dyn ProfileRepository>,
        commissions: Arc<CommissionCrediting>,
        email_sender: Arc<dyn EmailSender>,
        recorder: Arc<EventRecorder>,
        floor: AmountFloor,
        app_url: String,
    ) -> Self {
        Self {
            gateway,
            ledger,
            profiles,
            commissions,
            email_sender,
            recorder,
            floor,
            app_url,
        }
    }

    pub async fn handle(
        &self,
        cmd: ProcessPaymentCommand,
    ) -> Result<SettlementOutcome, WebhookError> {
        let payment_id = cmd.payment_id;

        // 1. Authoritative lookup
        let payment = self.gateway.get_payment(&payment_id).await.map_err(|err| {
            tracing::error!(payment_id = %payment_id, error = %err, "Payment lookup failed");
            WebhookError::Gateway(err.to_string())
        })?;

        // 2. Resolve the external reference
        let Some(raw_reference) = payment
            .external_reference
            .as_deref()
            .filter(|r| !r.is_empty())
        else {
            tracing::info!(payment_id = %payment_id, "Payment without external reference, ignoring");
            return Ok(SettlementOutcome::Ignored);
        };
        let reference: PurchaseReference = raw_reference.parse().map_err(|err| {
            tracing::warn!(
                payment_id = %payment_id,
                external_reference = %raw_reference,
                error = %err,
                "Malformed external reference"
            );
            WebhookError::InvalidReference(err)
        })?;

        // 3. Route on the gateway status
        match PaymentDisposition::from_gateway_status(&payment.status) {
            PaymentDisposition::Approve => self.approve(&payment_id, &payment, &reference).await,
            PaymentDisposition::Fail => {
                tracing::info!(
                    payment_id = %payment_id,
                    user_id = %reference.user_id,
                    subject_id = %reference.subject_id,
                    status = %payment.status,
                    "Payment not approved"
                );
                self.recorder
                    .record(
                        Some(&reference.user_id),
                        AccessEvent::PaymentFailed {
                            subject_id: reference.subject_id.clone(),
                            group: reference.group,
                            payment_id: payment_id.to_string(),
                            gateway_status: payment.status.clone(),
                            status_detail: payment.status_detail.clone(),
                        },
                        Timestamp::now(),
                    )
                    .await;
                Ok(SettlementOutcome::PaymentFailed)
            }
            PaymentDisposition::Ignore => {
                tracing::info!(
                    payment_id = %payment_id,
                    status = %payment.status,
                    "Payment status needs no action"
                );
                Ok(SettlementOutcome::NoAction(payment.status))
            }
        }
    }

    async fn approve(
        &self,
        payment_id: &PaymentId,
        payment: &GatewayPayment,
        reference: &PurchaseReference,
    ) -> Result<SettlementOutcome, WebhookError> {
        let now = Timestamp::now();
        let PurchaseReference {
            user_id,
            subject_id,
            group,
        } = reference;

        // a. Idempotency under redelivery
        if let Some(existing) = self.ledger.get_access(user_id, subject_id).await? {
            if existing.is_approved() {
                tracing::info!(
                    payment_id = %payment_id,
                    user_id = %user_id,
                    subject_id = %subject_id,
                    "Access already approved, duplicate notification"
                );
                return Ok(SettlementOutcome::AlreadyApproved);
            }
        }

        // b. Amount floor
        let amount = match payment.transaction_amount {
            Some(amount) if self.floor.accepts(Some(amount)) => amount,
            other => {
                tracing::warn!(
                    payment_id = %payment_id,
                    user_id = %user_id,
                    subject_id = %subject_id,
                    amount = ?other,
                    floor = %self.floor.threshold(),
                    "Suspicious payment amount, access not granted"
                );
                self.recorder
                    .record(
                        Some(user_id),
                        AccessEvent::PaymentSuspicious {
                            subject_id: subject_id.clone(),
                            payment_id: payment_id.to_string(),
                            amount: other,
                            floor: self.floor.threshold(),
                        },
                        now,
                    )
                    .await;
                return Err(WebhookError::SuspiciousAmount {
                    payment_id: payment_id.to_string(),
                    amount: other,
                    floor: self.floor.threshold(),
                });
            }
        };

        // c. Primary transition
        let outcome = self
            .ledger
            .confirm_approved(user_id, subject_id, *group, payment_id.as_str(), amount, now)
            .await?;
        if outcome == ConfirmOutcome::AlreadyApproved {
            return Ok(SettlementOutcome::AlreadyApproved);
        }

        // d. Side effects
        self.recorder
            .record(
                Some(user_id),
                AccessEvent::PaymentSuccess {
                    subject_id: subject_id.clone(),
                    group: *group,
                    payment_id: payment_id.to_string(),
                    amount,
                },
                now,
            )
            .await;

        if amount > Money::ZERO {
            if let Err(err) = self.commissions.credit(user_id, subject_id, amount, now).await {
                tracing::error!(
                    payment_id = %payment_id,
                    user_id = %user_id,
                    error = %err,
                    "Commission crediting failed"
                );
            }
        }

        self.send_confirmation(reference, amount).await;

        Ok(SettlementOutcome::Approved)
    }

    async fn send_confirmation(&self, reference: &PurchaseReference, amount: Money) {
        let profile = match self.profiles.find(&reference.user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(user_id = %reference.user_id, error = %err, "Profile lookup for email failed");
                return;
            }
        };
        let Some(to) = profile.email.as_deref() else {
            return;
        };

        let message = confirmation_email(
            to,
            profile.first_name(),
            &reference.subject_id,
            reference.group,
            amount,
            &self.app_url,
        );
        if let Err(err) = self.email_sender.send(&message).await {
            tracing::warn!(user_id = %reference.user_id, error = %err, "Confirmation email failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryAccessRepository, InMemoryCommissionLedger, InMemoryEventLog,
        InMemoryProfileRepository, RecordingEmailSender,
    };
    use crate::adapters::mercadopago::MockPaymentGateway;
    use crate::domain::access::{AccessPolicy, AccessStatus};
    use crate::domain::foundation::{GroupNumber, ReferralCode, SubjectId, UserId};
    use crate::ports::{GatewayError, Profile};

    // ════════════════════════════════════════════════════════════════════════════
    // Fixture
    // ════════════════════════════════════════════════════════════════════════════

    struct Fixture {
        handler: ProcessPaymentHandler,
        gateway: Arc<MockPaymentGateway>,
        ledger: Arc<AccessLedger>,
        access: Arc<InMemoryAccessRepository>,
        profiles: Arc<InMemoryProfileRepository>,
        commissions: Arc<InMemoryCommissionLedger>,
        events: Arc<InMemoryEventLog>,
        email: Arc<RecordingEmailSender>,
    }

    fn fixture() -> Fixture {
        let gateway = Arc::new(MockPaymentGateway::new());
        let access = Arc::new(InMemoryAccessRepository::new());
        let ledger = Arc::new(AccessLedger::new(access.clone(), AccessPolicy::default()));
        let profiles = Arc::new(InMemoryProfileRepository::new());
        let commissions = Arc::new(InMemoryCommissionLedger::new());
        let events = Arc::new(InMemoryEventLog::new());
        let email = Arc::new(RecordingEmailSender::new());
        let recorder = Arc::new(EventRecorder::new(events.clone(), email.clone(), None));
        let crediting = Arc::new(CommissionCrediting::new(
            profiles.clone(),
            commissions.clone(),
            recorder.clone(),
        ));
        let handler = ProcessPaymentHandler::new(
            gateway.clone(),
            ledger.clone(),
            profiles.clone(),
            crediting,
            email.clone(),
            recorder,
            AmountFloor::default(),
            "https://app.example.com".into(),
        );
        Fixture {
            handler,
            gateway,
            ledger,
            access,
            profiles,
            commissions,
            events,
            email,
        }
    }

    fn pid(id: &str) -> ProcessPaymentCommand {
        ProcessPaymentCommand {
            payment_id: PaymentId::new(id).unwrap(),
        }
    }

    fn user() -> UserId {
        UserId::new("U").unwrap()
    }

    fn cm() -> SubjectId {
        SubjectId::new("cm").unwrap()
    }

    async fn pending(f: &Fixture) {
        f.ledger
            .mark_pending(&user(), &cm(), Some(GroupNumber::new(5).unwrap()), None, Timestamp::now())
            .await
            .unwrap();
    }

    async fn referred_buyer(f: &Fixture) {
        f.profiles
            .insert(Profile {
                user_id: UserId::new("A").unwrap(),
                email: None,
                name: None,
                referred_by: None,
                referral_code: Some(ReferralCode::new("ACODE").unwrap()),
                is_admin: false,
                is_vip: false,
            })
            .await;
        f.profiles
            .insert(Profile {
                user_id: user(),
                email: Some("u@example.com".into()),
                name: Some("Ursula Lima".into()),
                referred_by: Some(ReferralCode::new("ACODE").unwrap()),
                referral_code: None,
                is_admin: false,
                is_vip: false,
            })
            .await;
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Approval
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn approved_payment_grants_access() {
        let f = fixture();
        pending(&f).await;
        f.gateway.add_simple_payment("777", "approved", "U|cm|5", 1690);

        let outcome = f.handler.handle(pid("777")).await.unwrap();

        assert_eq!(outcome, SettlementOutcome::Approved);
        let entry = f.ledger.get_access(&user(), &cm()).await.unwrap().unwrap();
        assert_eq!(entry.status, AccessStatus::Approved);
        assert_eq!(entry.group.value(), 5);
        assert_eq!(entry.payment_reference.as_deref(), Some("777"));
        assert_eq!(entry.amount_paid.map(|m| m.cents()), Some(1690));
        assert_eq!(f.events.count_of("payment_success").await, 1);
    }

    #[tokio::test]
    async fn replayed_notification_changes_nothing() {
        let f = fixture();
        referred_buyer(&f).await;
        pending(&f).await;
        f.gateway.add_simple_payment("777", "approved", "U|cm|5", 1690);

        for _ in 0..3 {
            f.handler.handle(pid("777")).await.unwrap();
        }

        assert_eq!(f.access.entry_count().await, 1);
        assert_eq!(f.commissions.all().await.len(), 1);
        assert_eq!(f.events.count_of("payment_success").await, 1);
        assert_eq!(f.email.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn approval_without_prior_row_creates_approved_entry() {
        let f = fixture();
        f.gateway.add_simple_payment("5", "approved", "U|cm|2", 1990);

        f.handler.handle(pid("5")).await.unwrap();

        let entry = f.ledger.get_access(&user(), &cm()).await.unwrap().unwrap();
        assert_eq!(entry.status, AccessStatus::Approved);
    }

    #[tokio::test]
    async fn referred_buyer_credits_affiliate_and_gets_email() {
        let f = fixture();
        referred_buyer(&f).await;
        f.gateway
            .add_simple_payment("9", "approved", "U|go|1", 1990);

        f.handler.handle(pid("9")).await.unwrap();

        let rows = f.commissions.all().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].commission_percent, 10);
        assert_eq!(rows[0].commission_amount.cents(), 199);
        let sent = f.email.sent().await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].html.contains("Ursula"));
    }

    #[tokio::test]
    async fn email_failure_does_not_block_access() {
        let f = fixture();
        referred_buyer(&f).await;
        f.email.fail_sends(true);
        f.gateway.add_simple_payment("9", "approved", "U|cm|1", 1990);

        let outcome = f.handler.handle(pid("9")).await.unwrap();

        assert_eq!(outcome, SettlementOutcome::Approved);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Rejections
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn amount_below_floor_is_suspicious() {
        let f = fixture();
        pending(&f).await;
        f.gateway.add_simple_payment("8", "approved", "U|cm|5", 100);

        let err = f.handler.handle(pid("8")).await.unwrap_err();

        assert!(matches!(err, WebhookError::SuspiciousAmount { .. }));
        let entry = f.ledger.get_access(&user(), &cm()).await.unwrap().unwrap();
        assert_eq!(entry.status, AccessStatus::Pending);
        assert_eq!(f.events.count_of("payment_suspicious").await, 1);
    }

    #[tokio::test]
    async fn missing_amount_is_suspicious() {
        let f = fixture();
        f.gateway.add_payment(GatewayPayment {
            id: "8".into(),
            status: "approved".into(),
            status_detail: None,
            external_reference: Some("U|cm|5".into()),
            transaction_amount: None,
        });

        let err = f.handler.handle(pid("8")).await.unwrap_err();

        assert!(matches!(err, WebhookError::SuspiciousAmount { amount: None, .. }));
    }

    #[tokio::test]
    async fn rejected_payment_records_failure_and_keeps_pending() {
        let f = fixture();
        pending(&f).await;
        f.gateway.add_simple_payment("3", "rejected", "U|cm|5", 1690);

        let outcome = f.handler.handle(pid("3")).await.unwrap();

        assert_eq!(outcome, SettlementOutcome::PaymentFailed);
        let entry = f.ledger.get_access(&user(), &cm()).await.unwrap().unwrap();
        assert_eq!(entry.status, AccessStatus::Pending);
        assert_eq!(f.events.count_of("payment_failed").await, 1);
    }

    #[tokio::test]
    async fn in_process_payment_needs_no_action() {
        let f = fixture();
        f.gateway.add_simple_payment("3", "in_process", "U|cm|5", 1690);

        let outcome = f.handler.handle(pid("3")).await.unwrap();

        assert_eq!(outcome, SettlementOutcome::NoAction("in_process".into()));
        assert_eq!(f.access.entry_count().await, 0);
    }

    #[tokio::test]
    async fn malformed_reference_is_rejected() {
        let f = fixture();
        for (id, reference) in [("1", "U|cm"), ("2", "|cm|5"), ("3", "U|cm|0"), ("4", "U|cm|x")] {
            f.gateway.add_simple_payment(id, "approved", reference, 1690);
            let err = f.handler.handle(pid(id)).await.unwrap_err();
            assert!(matches!(err, WebhookError::InvalidReference(_)), "{}", reference);
        }
        assert_eq!(f.access.entry_count().await, 0);
    }

    #[tokio::test]
    async fn missing_reference_is_ignored() {
        let f = fixture();
        f.gateway.add_payment(GatewayPayment {
            id: "4".into(),
            status: "approved".into(),
            status_detail: None,
            external_reference: None,
            transaction_amount: Money::from_cents(1990).ok(),
        });

        assert_eq!(f.handler.handle(pid("4")).await.unwrap(), SettlementOutcome::Ignored);
    }

    #[tokio::test]
    async fn gateway_timeout_leaves_state_untouched() {
        let f = fixture();
        pending(&f).await;
        f.gateway.fail_method("get_payment", GatewayError::Timeout);

        let err = f.handler.handle(pid("1")).await.unwrap_err();

        assert!(matches!(err, WebhookError::Gateway(_)));
        assert!(err.is_retryable());
        let entry = f.ledger.get_access(&user(), &cm()).await.unwrap().unwrap();
        assert_eq!(entry.status, AccessStatus::Pending);
    }

    #[tokio::test]
    async fn storage_failure_is_retryable() {
        let f = fixture();
        f.access.fail_writes(true);
        f.gateway.add_simple_payment("6", "approved", "U|cm|5", 1690);

        let err = f.handler.handle(pid("6")).await.unwrap_err();

        assert!(matches!(err, WebhookError::Database(_)));
        assert_eq!(f.events.count_of("payment_success").await, 0);
    }
}
