use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::IdentityAdmin;

#[derive(Default)]
struct State {
    deleted: Vec<UserId>,
    passwords: HashMap<UserId, String>,
}

#[derive(Default)]
pub struct InMemoryIdentityAdmin {
    state: Mutex<State>,
    fail: AtomicBool,
}

impl InMemoryIdentityAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_calls(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn deleted(&self) -> Vec<UserId> {
        self.state.lock().await.deleted.clone()
    }

    pub async fn password_of(&self, user_id: &UserId) -> Option<String> {
        self.state.lock().await.passwords.get(user_id).cloned()
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                "identity provider unavailable",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityAdmin for InMemoryIdentityAdmin {
    async fn delete_user(&self, user_id: &UserId) -> Result<(), DomainError> {
        self.check()?;
        self.state.lock().await.deleted.push(user_id.clone());
        Ok(())
    }

    async fn set_password(&self, user_id: &UserId, password: &str) -> Result<(), DomainError> {
        self.check()?;
        self.state
            .lock()
            .await
            .passwords
            .insert(user_id.clone(), password.to_string());
        Ok(())
    }
}
