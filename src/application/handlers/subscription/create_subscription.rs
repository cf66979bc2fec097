//! CreateSubscriptionHandler - Command handler for monthly recurring access.

use std::sync::Arc;

use crate::application::handlers::{CheckoutLinks, EventRecorder, HandlerError};
use crate::domain::access::{Pricing, SubscriptionReference};
use crate::domain::foundation::{AuthenticatedUser, PreapprovalId, Timestamp};
use crate::domain::settlement::AccessEvent;
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use crate::ports::{PaymentGateway, PreapprovalRequest, ProfileRepository, SubscriptionRepository};

const SUBSCRIPTION_REASON: &str = "Cronograma Internato - Assinatura mensal";

#[derive(Debug, Clone)]
pub struct CreateSubscriptionCommand {
    pub user: AuthenticatedUser,
}

#[derive(Debug, Clone)]
pub struct CreateSubscriptionResult {
    pub checkout_url: String,
    pub preapproval_id: PreapprovalId,
}

/// Handler for subscription checkout.
///
/// Creates the gateway preapproval first, then inserts or reactivates the
/// local row as pending. The row becomes authorized only through settlement.
pub struct CreateSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    profiles: Arc<dyn ProfileRepository>,
    gateway: Arc<dyn PaymentGateway>,
    recorder: Arc<EventRecorder>,
    pricing: Pricing,
    links: CheckoutLinks,
}

impl CreateSubscriptionHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        profiles: Arc<dyn ProfileRepository>,
        gateway: Arc<dyn PaymentGateway>,
        recorder: Arc<EventRecorder>,
        pricing: Pricing,
        links: CheckoutLinks,
    ) -> Self {
        Self {
            subscriptions,
            profiles,
            gateway,
            recorder,
            pricing,
            links,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateSubscriptionCommand,
    ) -> Result<CreateSubscriptionResult, HandlerError> {
        let now = Timestamp::now();
        let user_id = &cmd.user.id;

        // 1. One authorized subscription per user
        let existing = self.subscriptions.find_by_user(user_id).await?;
        if existing
            .as_ref()
            .map_or(false, |s| s.status == SubscriptionStatus::Authorized)
        {
            return Err(HandlerError::SubscriptionAlreadyActive);
        }

        // 2. Payer email: profile first, then the token
        let payer_email = self
            .profiles
            .find(user_id)
            .await?
            .and_then(|p| p.email)
            .or_else(|| cmd.user.email.clone())
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| HandlerError::validation("email", "no email on file for payer"))?;

        // 3. Create the preapproval
        let amount = self.pricing.subscription_monthly;
        let checkout = self
            .gateway
            .create_preapproval(PreapprovalRequest {
                reason: SUBSCRIPTION_REASON.to_string(),
                external_reference: SubscriptionReference {
                    user_id: user_id.clone(),
                }
                .to_string(),
                payer_email,
                monthly_amount: amount,
                currency: self.pricing.currency.clone(),
                back_url: self.links.subscription_back_url()?,
                notification_url: self.links.notification_url.clone(),
            })
            .await?;
        let preapproval_id = PreapprovalId::new(checkout.id.clone())?;

        // 4. Insert or reactivate the local row
        let subscription = match existing {
            Some(mut current) => {
                current.reactivate(preapproval_id.clone(), amount, now)?;
                current
            }
            None => Subscription::new_pending(user_id.clone(), preapproval_id.clone(), amount, now),
        };
        self.subscriptions.save(&subscription).await?;

        // 5. Audit
        self.recorder
            .record(
                Some(user_id),
                AccessEvent::SubscriptionCreated {
                    preapproval_id: preapproval_id.to_string(),
                    amount,
                },
                now,
            )
            .await;

        tracing::info!(
            user_id = %user_id,
            preapproval_id = %preapproval_id,
            "Subscription checkout created"
        );

        Ok(CreateSubscriptionResult {
            checkout_url: checkout.checkout_url(self.gateway.is_sandbox()).to_string(),
            preapproval_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryEventLog, InMemoryProfileRepository, InMemorySubscriptionRepository,
        RecordingEmailSender,
    };
    use crate::adapters::mercadopago::MockPaymentGateway;
    use crate::domain::foundation::{Money, UserId};

    struct Fixture {
        handler: CreateSubscriptionHandler,
        subscriptions: Arc<InMemorySubscriptionRepository>,
        gateway: Arc<MockPaymentGateway>,
        events: Arc<InMemoryEventLog>,
    }

    fn fixture() -> Fixture {
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
        let gateway = Arc::new(MockPaymentGateway::new());
        let events = Arc::new(InMemoryEventLog::new());
        let recorder = Arc::new(EventRecorder::new(
            events.clone(),
            Arc::new(RecordingEmailSender::new()),
            None,
        ));
        Fixture {
            handler: CreateSubscriptionHandler::new(
                subscriptions.clone(),
                Arc::new(InMemoryProfileRepository::new()),
                gateway.clone(),
                recorder,
                Pricing::default(),
                CheckoutLinks::new("https://app.example.com/", "https://api.example.com/hook"),
            ),
            subscriptions,
            gateway,
            events,
        }
    }

    fn user() -> AuthenticatedUser {
        AuthenticatedUser::new(UserId::new("u1").unwrap(), Some("u1@example.com".into()))
    }

    fn existing(status: SubscriptionStatus) -> Subscription {
        let mut sub = Subscription::new_pending(
            UserId::new("u1").unwrap(),
            PreapprovalId::new("old").unwrap(),
            Money::from_cents(990).unwrap(),
            Timestamp::now(),
        );
        sub.status = status;
        sub
    }

    #[tokio::test]
    async fn creates_pending_subscription() {
        let f = fixture();

        let result = f
            .handler
            .handle(CreateSubscriptionCommand { user: user() })
            .await
            .unwrap();

        let stored = f
            .subscriptions
            .find_by_user(&UserId::new("u1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Pending);
        assert_eq!(stored.preapproval_id, result.preapproval_id);

        let requests = f.gateway.preapproval_requests();
        assert_eq!(requests[0].external_reference, "sub|u1");
        assert_eq!(requests[0].payer_email, "u1@example.com");
        assert_eq!(requests[0].monthly_amount.cents(), 990);
        assert_eq!(f.events.count_of("subscription_created").await, 1);
    }

    #[tokio::test]
    async fn authorized_subscription_is_a_conflict() {
        let f = fixture();
        f.subscriptions.seed(existing(SubscriptionStatus::Authorized)).await;

        let err = f
            .handler
            .handle(CreateSubscriptionCommand { user: user() })
            .await
            .unwrap_err();

        assert_eq!(err, HandlerError::SubscriptionAlreadyActive);
        assert!(f.gateway.preapproval_requests().is_empty());
    }

    #[tokio::test]
    async fn cancelled_subscription_is_reactivated() {
        let f = fixture();
        f.subscriptions.seed(existing(SubscriptionStatus::Cancelled)).await;

        let result = f
            .handler
            .handle(CreateSubscriptionCommand { user: user() })
            .await
            .unwrap();

        let stored = f
            .subscriptions
            .find_by_user(&UserId::new("u1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Pending);
        assert_eq!(stored.preapproval_id, result.preapproval_id);
        assert!(stored.cancelled_at.is_none());
    }

    #[tokio::test]
    async fn missing_email_is_rejected() {
        let f = fixture();
        let user = AuthenticatedUser::new(UserId::new("u1").unwrap(), None);

        let err = f
            .handler
            .handle(CreateSubscriptionCommand { user })
            .await
            .unwrap_err();

        assert!(matches!(err, HandlerError::Validation { .. }));
    }
}
