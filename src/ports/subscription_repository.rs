//! SubscriptionRepository port.
//!
//! One row per user. Writes are version-checked like access entries;
//! recurring payments are recorded in a processed-payment table in the same
//! transaction as the period extension, so a redelivered charge notification
//! cannot extend the period twice.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PaymentId, PreapprovalId, UserId};
use crate::domain::subscription::Subscription;

use super::SaveResult;

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError>;

    async fn find_by_preapproval(
        &self,
        preapproval_id: &PreapprovalId,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Inserts (version 0) or compare-and-swaps (version > 0).
    ///
    /// Returns `ErrorCode::ConcurrentModification` on a stale version.
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Saves the subscription and marks `payment_id` processed, atomically.
    ///
    /// `AlreadyExists` means the payment was seen before; nothing is written.
    async fn save_with_payment(
        &self,
        subscription: &Subscription,
        payment_id: &PaymentId,
    ) -> Result<SaveResult, DomainError>;
}
