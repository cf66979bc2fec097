use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::foundation::{DomainError, PaymentId, PreapprovalId, UserId};
use crate::domain::subscription::Subscription;
use crate::ports::{SaveResult, SubscriptionRepository};

#[derive(Default)]
struct State {
    by_user: HashMap<UserId, Subscription>,
    processed_payments: HashSet<String>,
}

/// In-memory subscriptions with the same CAS and payment dedup rules as
/// the Postgres adapter.
#[derive(Default)]
pub struct InMemorySubscriptionRepository {
    state: Mutex<State>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, mut subscription: Subscription) {
        subscription.version = subscription.version.max(1);
        self.state
            .lock()
            .await
            .by_user
            .insert(subscription.user_id.clone(), subscription);
    }

    pub async fn processed_payment_count(&self) -> usize {
        self.state.lock().await.processed_payments.len()
    }
}

fn write(state: &mut State, subscription: &Subscription) -> Result<(), DomainError> {
    let current = state.by_user.get(&subscription.user_id).map(|s| s.version);
    match (current, subscription.version) {
        (None, 0) => {}
        (Some(v), expected) if v == expected && expected > 0 => {}
        _ => {
            return Err(DomainError::concurrent_modification(
                "subscription version changed",
            ))
        }
    }
    let mut stored = subscription.clone();
    stored.version += 1;
    state.by_user.insert(stored.user_id.clone(), stored);
    Ok(())
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError> {
        Ok(self.state.lock().await.by_user.get(user_id).cloned())
    }

    async fn find_by_preapproval(
        &self,
        preapproval_id: &PreapprovalId,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .state
            .lock()
            .await
            .by_user
            .values()
            .find(|s| &s.preapproval_id == preapproval_id)
            .cloned())
    }

    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;
        write(&mut state, subscription)
    }

    async fn save_with_payment(
        &self,
        subscription: &Subscription,
        payment_id: &PaymentId,
    ) -> Result<SaveResult, DomainError> {
        let mut state = self.state.lock().await;
        if state.processed_payments.contains(payment_id.as_str()) {
            return Ok(SaveResult::AlreadyExists);
        }
        write(&mut state, subscription)?;
        state.processed_payments.insert(payment_id.as_str().to_string());
        Ok(SaveResult::Inserted)
    }
}
