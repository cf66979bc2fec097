use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::ports::{EmailMessage, EmailSender};

/// Logs the recipient and subject, sends nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyEmailSender;

#[async_trait]
impl EmailSender for LogOnlyEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), DomainError> {
        tracing::info!(to = %message.to, subject = %message.subject, "Email not sent (no provider)");
        Ok(())
    }
}
