//! HandleNotificationHandler - Entry point for gateway notifications.
//!
//! Extracts topic and id, validates the id, verifies the signature and
//! routes to the topic's processor. Nothing is read or written before the
//! signature checks out.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::foundation::{PaymentId, PreapprovalId};
use crate::domain::settlement::{
    Notification, NotificationTopic, SignatureVerifier, WebhookError,
};

use super::{
    ProcessAuthorizedPaymentCommand, ProcessAuthorizedPaymentHandler, ProcessPaymentCommand,
    ProcessPaymentHandler, ProcessPreapprovalCommand, ProcessPreapprovalHandler,
    SettlementOutcome,
};

/// Raw notification as received over HTTP.
#[derive(Debug, Clone, Default)]
pub struct HandleNotificationCommand {
    pub query: HashMap<String, String>,
    pub body: Vec<u8>,
    pub signature: Option<String>,
    pub request_id: Option<String>,
}

pub struct HandleNotificationHandler {
    verifier: Arc<SignatureVerifier>,
    payments: Arc<ProcessPaymentHandler>,
    preapprovals: Arc<ProcessPreapprovalHandler>,
    authorized_payments: Arc<ProcessAuthorizedPaymentHandler>,
}

impl HandleNotificationHandler {
    pub fn new(
        verifier: Arc<SignatureVerifier>,
        payments: Arc<ProcessPaymentHandler>,
        preapprovals: Arc<ProcessPreapprovalHandler>,
        authorized_payments: Arc<ProcessAuthorizedPaymentHandler>,
    ) -> Self {
        Self {
            verifier,
            payments,
            preapprovals,
            authorized_payments,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandleNotificationCommand,
    ) -> Result<SettlementOutcome, WebhookError> {
        // 1. Topic and id
        let Some(notification) = Notification::extract(&cmd.query, &cmd.body) else {
            tracing::debug!("Notification without topic or id, ignoring");
            return Ok(SettlementOutcome::Ignored);
        };

        match notification.topic {
            NotificationTopic::Payment => {
                let payment_id = PaymentId::new(notification.data_id.clone())
                    .map_err(|_| WebhookError::InvalidPaymentId(notification.data_id.clone()))?;
                self.verify(&cmd, &notification.data_id)?;
                self.payments
                    .handle(ProcessPaymentCommand { payment_id })
                    .await
            }
            NotificationTopic::Preapproval => {
                let preapproval_id = PreapprovalId::new(notification.data_id.clone())
                    .map_err(|_| WebhookError::InvalidPaymentId(notification.data_id.clone()))?;
                self.verify(&cmd, &notification.data_id)?;
                self.preapprovals
                    .handle(ProcessPreapprovalCommand { preapproval_id })
                    .await
            }
            NotificationTopic::AuthorizedPayment => {
                let payment_id = PaymentId::new(notification.data_id.clone())
                    .map_err(|_| WebhookError::InvalidPaymentId(notification.data_id.clone()))?;
                self.verify(&cmd, &notification.data_id)?;
                self.authorized_payments
                    .handle(ProcessAuthorizedPaymentCommand { payment_id })
                    .await
            }
            NotificationTopic::Other(topic) => {
                tracing::debug!(topic = %topic, "Notification topic not handled");
                Ok(SettlementOutcome::Ignored)
            }
        }
    }

    fn verify(&self, cmd: &HandleNotificationCommand, data_id: &str) -> Result<(), WebhookError> {
        if self.verifier.verify(
            data_id,
            cmd.signature.as_deref(),
            cmd.request_id.as_deref(),
        ) {
            return Ok(());
        }
        tracing::warn!(
            data_id,
            request_id = cmd.request_id.as_deref().unwrap_or(""),
            has_signature = cmd.signature.is_some(),
            "Notification signature rejected"
        );
        Err(WebhookError::InvalidSignature)
    }
}
