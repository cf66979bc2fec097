//! ProcessAuthorizedPaymentHandler - Recurring subscription charges.
//!
//! Each distinct charge extends the period once. The payment id is stored in
//! the same write as the extension, so a redelivered charge is recognized
//! and skipped.

use std::sync::Arc;

use crate::application::handlers::EventRecorder;
use crate::domain::access::{AccessPolicy, MAX_ATTEMPTS};
use crate::domain::foundation::{PaymentId, PreapprovalId, Timestamp};
use crate::domain::settlement::{AccessEvent, WebhookError};
use crate::ports::{PaymentGateway, SaveResult, SubscriptionRepository};

use super::SettlementOutcome;

#[derive(Debug, Clone)]
pub struct ProcessAuthorizedPaymentCommand {
    pub payment_id: PaymentId,
}

pub struct ProcessAuthorizedPaymentHandler {
    gateway: Arc<dyn PaymentGateway>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    recorder: Arc<EventRecorder>,
    policy: AccessPolicy,
}

impl ProcessAuthorizedPaymentHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        recorder: Arc<EventRecorder>,
        policy: AccessPolicy,
    ) -> Self {
        Self {
            gateway,
            subscriptions,
            recorder,
            policy,
        }
    }

    pub async fn handle(
        &self,
        cmd: ProcessAuthorizedPaymentCommand,
    ) -> Result<SettlementOutcome, WebhookError> {
        let payment_id = cmd.payment_id;

        let charge = self
            .gateway
            .get_authorized_payment(&payment_id)
            .await
            .map_err(|err| {
                tracing::error!(payment_id = %payment_id, error = %err, "Authorized payment lookup failed");
                WebhookError::Gateway(err.to_string())
            })?;

        // Only a settled charge extends the period; a missing status is not settled.
        match charge.payment_status.as_deref() {
            Some("approved") => {}
            other => {
                let status = other.unwrap_or("unknown");
                tracing::info!(payment_id = %payment_id, status, "Recurring charge not approved");
                return Ok(SettlementOutcome::NoAction(status.to_string()));
            }
        }

        let Ok(preapproval_id) = PreapprovalId::new(charge.preapproval_id.clone()) else {
            tracing::warn!(payment_id = %payment_id, "Recurring charge without preapproval id");
            return Ok(SettlementOutcome::Ignored);
        };

        for attempt in 1..=MAX_ATTEMPTS {
            let now = Timestamp::now();
            let Some(mut subscription) =
                self.subscriptions.find_by_preapproval(&preapproval_id).await?
            else {
                tracing::warn!(
                    payment_id = %payment_id,
                    preapproval_id = %preapproval_id,
                    "No subscription for recurring charge"
                );
                return Ok(SettlementOutcome::Ignored);
            };

            let period_end = subscription.record_recurring_payment(&self.policy, now)?;

            match self
                .subscriptions
                .save_with_payment(&subscription, &payment_id)
                .await
            {
                Ok(SaveResult::Inserted) => {
                    tracing::info!(
                        user_id = %subscription.user_id,
                        payment_id = %payment_id,
                        current_period_end = %period_end.to_rfc3339(),
                        "Subscription period extended"
                    );
                    self.recorder
                        .record(
                            Some(&subscription.user_id),
                            AccessEvent::SubscriptionPayment {
                                preapproval_id: preapproval_id.to_string(),
                                payment_id: payment_id.to_string(),
                                current_period_end: period_end,
                            },
                            now,
                        )
                        .await;
                    return Ok(SettlementOutcome::RecurringPaymentRecorded);
                }
                Ok(SaveResult::AlreadyExists) => {
                    tracing::info!(payment_id = %payment_id, "Recurring charge already applied");
                    return Ok(SettlementOutcome::DuplicateRecurringPayment);
                }
                Err(err) if err.is_concurrent_modification() => {
                    tracing::debug!(payment_id = %payment_id, attempt, "Subscription changed concurrently, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(WebhookError::Database(format!(
            "subscription for charge {} kept changing concurrently",
            payment_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryEventLog, InMemorySubscriptionRepository, RecordingEmailSender,
    };
    use crate::adapters::mercadopago::MockPaymentGateway;
    use crate::domain::foundation::{Money, UserId};
    use crate::domain::subscription::{Subscription, SubscriptionStatus};
    use crate::ports::GatewayAuthorizedPayment;

    struct Fixture {
        handler: ProcessAuthorizedPaymentHandler,
        gateway: Arc<MockPaymentGateway>,
        subscriptions: Arc<InMemorySubscriptionRepository>,
    }

    async fn fixture(period_end: Option<Timestamp>) -> Fixture {
        let gateway = Arc::new(MockPaymentGateway::new());
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
        let mut sub = Subscription::new_pending(
            UserId::new("u1").unwrap(),
            PreapprovalId::new("pre-1").unwrap(),
            Money::from_cents(990).unwrap(),
            Timestamp::now(),
        );
        sub.status = SubscriptionStatus::Authorized;
        sub.current_period_end = period_end;
        subscriptions.seed(sub).await;
        let recorder = Arc::new(EventRecorder::new(
            Arc::new(InMemoryEventLog::new()),
            Arc::new(RecordingEmailSender::new()),
            None,
        ));
        Fixture {
            handler: ProcessAuthorizedPaymentHandler::new(
                gateway.clone(),
                subscriptions.clone(),
                recorder,
                AccessPolicy::default(),
            ),
            gateway,
            subscriptions,
        }
    }

    fn charge(f: &Fixture, id: &str, status: &str) {
        f.gateway.add_authorized_payment(GatewayAuthorizedPayment {
            id: id.into(),
            preapproval_id: "pre-1".into(),
            payment_status: Some(status.into()),
            transaction_amount: Money::from_cents(990).ok(),
        });
    }

    fn command(id: &str) -> ProcessAuthorizedPaymentCommand {
        ProcessAuthorizedPaymentCommand {
            payment_id: PaymentId::new(id).unwrap(),
        }
    }

    async fn period_end(f: &Fixture) -> Option<Timestamp> {
        f.subscriptions
            .find_by_user(&UserId::new("u1").unwrap())
            .await
            .unwrap()
            .unwrap()
            .current_period_end
    }

    #[tokio::test]
    async fn charge_extends_from_previous_end() {
        let end = Timestamp::now().add_days(5);
        let f = fixture(Some(end)).await;
        charge(&f, "100", "approved");

        let outcome = f.handler.handle(command("100")).await.unwrap();

        assert_eq!(outcome, SettlementOutcome::RecurringPaymentRecorded);
        assert_eq!(period_end(&f).await, Some(end.add_days(30)));
    }

    #[tokio::test]
    async fn redelivered_charge_extends_once() {
        let f = fixture(None).await;
        charge(&f, "100", "approved");

        f.handler.handle(command("100")).await.unwrap();
        let after_first = period_end(&f).await;
        let outcome = f.handler.handle(command("100")).await.unwrap();

        assert_eq!(outcome, SettlementOutcome::DuplicateRecurringPayment);
        assert_eq!(period_end(&f).await, after_first);
        assert_eq!(f.subscriptions.processed_payment_count().await, 1);
    }

    #[tokio::test]
    async fn distinct_charges_each_extend() {
        let end = Timestamp::now().add_days(1);
        let f = fixture(Some(end)).await;
        charge(&f, "100", "approved");
        charge(&f, "101", "approved");

        f.handler.handle(command("100")).await.unwrap();
        f.handler.handle(command("101")).await.unwrap();

        assert_eq!(period_end(&f).await, Some(end.add_days(60)));
    }

    #[tokio::test]
    async fn unapproved_charge_needs_no_action() {
        let f = fixture(None).await;
        charge(&f, "100", "rejected");

        let outcome = f.handler.handle(command("100")).await.unwrap();

        assert_eq!(outcome, SettlementOutcome::NoAction("rejected".into()));
        assert_eq!(period_end(&f).await, None);
    }

    #[tokio::test]
    async fn charge_without_status_needs_no_action() {
        let f = fixture(None).await;
        f.gateway.add_authorized_payment(GatewayAuthorizedPayment {
            id: "100".into(),
            preapproval_id: "pre-1".into(),
            payment_status: None,
            transaction_amount: Money::from_cents(990).ok(),
        });

        let outcome = f.handler.handle(command("100")).await.unwrap();

        assert_eq!(outcome, SettlementOutcome::NoAction("unknown".into()));
        assert_eq!(period_end(&f).await, None);
        assert_eq!(f.subscriptions.processed_payment_count().await, 0);
    }
}
