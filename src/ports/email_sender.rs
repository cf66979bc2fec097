//! EmailSender port. Delivery is always best effort for callers.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), DomainError>;
}
