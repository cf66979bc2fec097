//! ProcessPreapprovalHandler - Syncs subscription status from the gateway.

use std::str::FromStr;
use std::sync::Arc;

use crate::application::handlers::EventRecorder;
use crate::domain::access::{AccessPolicy, MAX_ATTEMPTS};
use crate::domain::foundation::{ErrorCode, PreapprovalId, Timestamp};
use crate::domain::settlement::{AccessEvent, WebhookError};
use crate::domain::subscription::{StatusChange, Subscription, SubscriptionStatus};
use crate::ports::{PaymentGateway, SubscriptionRepository};

use super::SettlementOutcome;

#[derive(Debug, Clone)]
pub struct ProcessPreapprovalCommand {
    pub preapproval_id: PreapprovalId,
}

/// Applies the preapproval status the gateway reports.
///
/// Re-applying the same status is a no-op, so redelivery never extends the
/// period twice.
pub struct ProcessPreapprovalHandler {
    gateway: Arc<dyn PaymentGateway>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    recorder: Arc<EventRecorder>,
    policy: AccessPolicy,
}

impl ProcessPreapprovalHandler {
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
        cmd: ProcessPreapprovalCommand,
    ) -> Result<SettlementOutcome, WebhookError> {
        let preapproval_id = cmd.preapproval_id;

        // 1. Authoritative lookup
        let preapproval = self
            .gateway
            .get_preapproval(&preapproval_id)
            .await
            .map_err(|err| {
                tracing::error!(preapproval_id = %preapproval_id, error = %err, "Preapproval lookup failed");
                WebhookError::Gateway(err.to_string())
            })?;

        let Ok(status) = SubscriptionStatus::from_str(&preapproval.status) else {
            tracing::info!(
                preapproval_id = %preapproval_id,
                status = %preapproval.status,
                "Preapproval status needs no action"
            );
            return Ok(SettlementOutcome::NoAction(preapproval.status));
        };

        // 2. Apply with optimistic retries
        for attempt in 1..=MAX_ATTEMPTS {
            let now = Timestamp::now();
            let Some(mut subscription) =
                self.subscriptions.find_by_preapproval(&preapproval_id).await?
            else {
                tracing::warn!(preapproval_id = %preapproval_id, "No subscription for preapproval");
                return Ok(SettlementOutcome::Ignored);
            };

            match subscription.apply_gateway_status(status, &self.policy, now) {
                Ok(StatusChange::Updated) => {}
                Ok(StatusChange::Unchanged) => return Ok(SettlementOutcome::SubscriptionUnchanged),
                Err(err) if err.code == ErrorCode::InvalidStateTransition => {
                    tracing::warn!(
                        preapproval_id = %preapproval_id,
                        current = %subscription.status,
                        reported = %status,
                        "Preapproval status out of order, ignoring"
                    );
                    return Ok(SettlementOutcome::NoAction(status.to_string()));
                }
                Err(err) => return Err(err.into()),
            }

            match self.subscriptions.save(&subscription).await {
                Ok(()) => {
                    tracing::info!(
                        user_id = %subscription.user_id,
                        preapproval_id = %preapproval_id,
                        status = %status,
                        "Subscription status updated"
                    );
                    self.record(&subscription, now).await;
                    return Ok(SettlementOutcome::SubscriptionUpdated);
                }
                Err(err) if err.is_concurrent_modification() => {
                    tracing::debug!(preapproval_id = %preapproval_id, attempt, "Subscription changed concurrently, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(WebhookError::Database(format!(
            "subscription for preapproval {} kept changing concurrently",
            preapproval_id
        )))
    }

    async fn record(&self, subscription: &Subscription, now: Timestamp) {
        let preapproval_id = subscription.preapproval_id.to_string();
        let event = match subscription.status {
            SubscriptionStatus::Authorized => AccessEvent::SubscriptionAuthorized {
                preapproval_id,
                current_period_end: subscription.current_period_end,
            },
            SubscriptionStatus::Paused => AccessEvent::SubscriptionPaused { preapproval_id },
            SubscriptionStatus::Cancelled => AccessEvent::SubscriptionCancelled { preapproval_id },
            SubscriptionStatus::Pending => return,
        };
        self.recorder
            .record(Some(&subscription.user_id), event, now)
            .await;
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
    use crate::ports::{GatewayError, GatewayPreapproval};

    struct Fixture {
        handler: ProcessPreapprovalHandler,
        gateway: Arc<MockPaymentGateway>,
        subscriptions: Arc<InMemorySubscriptionRepository>,
        events: Arc<InMemoryEventLog>,
    }

    async fn fixture() -> Fixture {
        let gateway = Arc::new(MockPaymentGateway::new());
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
        subscriptions
            .seed(Subscription::new_pending(
                UserId::new("u1").unwrap(),
                PreapprovalId::new("pre-1").unwrap(),
                Money::from_cents(990).unwrap(),
                Timestamp::now(),
            ))
            .await;
        let events = Arc::new(InMemoryEventLog::new());
        let recorder = Arc::new(EventRecorder::new(
            events.clone(),
            Arc::new(RecordingEmailSender::new()),
            None,
        ));
        Fixture {
            handler: ProcessPreapprovalHandler::new(
                gateway.clone(),
                subscriptions.clone(),
                recorder,
                AccessPolicy::default(),
            ),
            gateway,
            subscriptions,
            events,
        }
    }

    fn gateway_says(f: &Fixture, status: &str) {
        f.gateway.add_preapproval(GatewayPreapproval {
            id: "pre-1".into(),
            status: status.into(),
            external_reference: Some("sub|u1".into()),
        });
    }

    fn command() -> ProcessPreapprovalCommand {
        ProcessPreapprovalCommand {
            preapproval_id: PreapprovalId::new("pre-1").unwrap(),
        }
    }

    async fn stored(f: &Fixture) -> Subscription {
        f.subscriptions
            .find_by_user(&UserId::new("u1").unwrap())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn authorized_opens_a_period() {
        let f = fixture().await;
        gateway_says(&f, "authorized");

        let outcome = f.handler.handle(command()).await.unwrap();

        assert_eq!(outcome, SettlementOutcome::SubscriptionUpdated);
        let sub = stored(&f).await;
        assert_eq!(sub.status, SubscriptionStatus::Authorized);
        assert!(sub.current_period_end.is_some());
        assert_eq!(f.events.count_of("subscription_authorized").await, 1);
    }

    #[tokio::test]
    async fn redelivered_authorization_does_not_extend_again() {
        let f = fixture().await;
        gateway_says(&f, "authorized");

        f.handler.handle(command()).await.unwrap();
        let first_end = stored(&f).await.current_period_end;
        let outcome = f.handler.handle(command()).await.unwrap();

        assert_eq!(outcome, SettlementOutcome::SubscriptionUnchanged);
        assert_eq!(stored(&f).await.current_period_end, first_end);
        assert_eq!(f.events.count_of("subscription_authorized").await, 1);
    }

    #[tokio::test]
    async fn cancellation_sets_cancelled_at() {
        let f = fixture().await;
        gateway_says(&f, "cancelled");

        f.handler.handle(command()).await.unwrap();

        let sub = stored(&f).await;
        assert_eq!(sub.status, SubscriptionStatus::Cancelled);
        assert!(sub.cancelled_at.is_some());
        assert_eq!(f.events.count_of("subscription_cancelled").await, 1);
    }

    #[tokio::test]
    async fn unknown_preapproval_is_ignored() {
        let f = fixture().await;
        f.gateway.add_preapproval(GatewayPreapproval {
            id: "other".into(),
            status: "authorized".into(),
            external_reference: Some("sub|u1".into()),
        });

        let outcome = f
            .handler
            .handle(ProcessPreapprovalCommand {
                preapproval_id: PreapprovalId::new("other").unwrap(),
            })
            .await
            .unwrap();

        assert_eq!(outcome, SettlementOutcome::Ignored);
        assert_eq!(stored(&f).await.status, SubscriptionStatus::Pending);
    }

    #[tokio::test]
    async fn unrecognized_status_needs_no_action() {
        let f = fixture().await;
        gateway_says(&f, "finished");

        let outcome = f.handler.handle(command()).await.unwrap();

        assert_eq!(outcome, SettlementOutcome::NoAction("finished".into()));
    }

    #[tokio::test]
    async fn gateway_failure_is_reported() {
        let f = fixture().await;
        f.gateway.fail_method("get_preapproval", GatewayError::Network("reset".into()));

        let err = f.handler.handle(command()).await.unwrap_err();

        assert!(matches!(err, WebhookError::Gateway(_)));
    }
}
