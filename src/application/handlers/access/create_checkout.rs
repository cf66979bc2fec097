//! CreateCheckoutHandler - Command handler for one-time subject purchases.

use std::sync::Arc;

use crate::application::handlers::{CheckoutLinks, EventRecorder, HandlerError};
use crate::domain::access::{AccessError, AccessLedger, Pricing, PurchaseReference};
use crate::domain::foundation::{GroupNumber, Money, SubjectId, Timestamp, UserId};
use crate::domain::settlement::AccessEvent;
use crate::ports::{PaymentGateway, PaymentMethod, PreferenceRequest, ProfileRepository};

/// Command to start a hosted checkout for one subject.
#[derive(Debug, Clone)]
pub struct CreateCheckoutCommand {
    pub user_id: UserId,
    pub subject_id: SubjectId,
    pub subject_label: String,
    pub group: GroupNumber,
    pub method: PaymentMethod,
}

/// Result of successful checkout creation.
#[derive(Debug, Clone)]
pub struct CreateCheckoutResult {
    pub checkout_url: String,
    pub preference_id: String,
    pub price: Money,
    pub sandbox: bool,
}

/// Handler for one-time checkouts.
///
/// The entry is moved to pending before the preference exists, so a payment
/// can never arrive for a row the ledger does not know about.
pub struct CreateCheckoutHandler {
    ledger: Arc<AccessLedger>,
    profiles: Arc<dyn ProfileRepository>,
    gateway: Arc<dyn PaymentGateway>,
    recorder: Arc<EventRecorder>,
    pricing: Pricing,
    links: CheckoutLinks,
}

impl CreateCheckoutHandler {
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
        cmd: CreateCheckoutCommand,
    ) -> Result<CreateCheckoutResult, HandlerError> {
        let now = Timestamp::now();
        let label = cmd.subject_label.trim();
        if label.is_empty() {
            return Err(HandlerError::validation("subject_label", "must not be empty"));
        }

        // 1. Never charge twice for the same subject
        if let Some(existing) = self.ledger.get_access(&cmd.user_id, &cmd.subject_id).await? {
            if existing.is_approved() {
                return Err(AccessError::already_has_access(&cmd.user_id, &cmd.subject_id).into());
            }
        }

        // 2. Price depends on the method and on whether the buyer was referred
        let referred = self
            .profiles
            .find(&cmd.user_id)
            .await?
            .map_or(false, |p| p.referred_by.is_some());
        let pix = cmd.method == PaymentMethod::Pix;
        let price = self.pricing.checkout_price(pix, referred);

        // 3. Record the pending entry
        self.ledger
            .mark_pending(&cmd.user_id, &cmd.subject_id, Some(cmd.group), None, now)
            .await?;

        // 4. Create the hosted checkout
        let reference =
            PurchaseReference::new(cmd.user_id.clone(), cmd.subject_id.clone(), cmd.group)
                .to_string();
        let suffix = if pix { " (PIX)" } else { "" };
        let checkout = self
            .gateway
            .create_preference(PreferenceRequest {
                title: format!("Cronograma - {} Grupo {}{}", label, cmd.group, suffix),
                unit_price: price,
                currency: self.pricing.currency.clone(),
                external_reference: reference.clone(),
                method: cmd.method,
                back_urls: self.links.back_urls(&reference)?,
                notification_url: self.links.notification_url.clone(),
                expires_at: None,
            })
            .await
            .map_err(|err| {
                tracing::error!(
                    user_id = %cmd.user_id,
                    subject_id = %cmd.subject_id,
                    error = %err,
                    "Failed to create checkout preference"
                );
                err
            })?;

        // 5. Remember the preference on the pending row. The pending entry
        // itself was committed in step 3 and settlement matches on the
        // external reference, so a failure here only loses the preference id.
        if let Err(err) = self
            .ledger
            .mark_pending(
                &cmd.user_id,
                &cmd.subject_id,
                None,
                Some(checkout.id.clone()),
                now,
            )
            .await
        {
            tracing::warn!(
                user_id = %cmd.user_id,
                subject_id = %cmd.subject_id,
                error = %err,
                "Failed to store preference id on pending entry"
            );
        }

        // 6. Audit
        self.recorder
            .record(
                Some(&cmd.user_id),
                AccessEvent::CheckoutCreated {
                    subject_id: cmd.subject_id.clone(),
                    group: cmd.group,
                    payment_method: cmd.method.as_str().to_string(),
                    price,
                    preference_id: checkout.id.clone(),
                },
                now,
            )
            .await;

        let sandbox = self.gateway.is_sandbox();
        tracing::info!(
            user_id = %cmd.user_id,
            subject_id = %cmd.subject_id,
            group = %cmd.group,
            price = %price,
            sandbox,
            "Checkout created"
        );

        Ok(CreateCheckoutResult {
            checkout_url: checkout.checkout_url(sandbox).to_string(),
            preference_id: checkout.id,
            price,
            sandbox,
        })
    }
}
