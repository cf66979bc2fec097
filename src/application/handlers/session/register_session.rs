//! RegisterSessionHandler - Admits a login and evicts older sessions.

use std::sync::Arc;

use crate::application::handlers::HandlerError;
use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::session::{SessionGuard, SessionToken};

#[derive(Debug, Clone)]
pub struct RegisterSessionCommand {
    pub user_id: UserId,
    pub device_info: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RegisterSessionResult {
    pub session: SessionToken,
}

pub struct RegisterSessionHandler {
    guard: Arc<SessionGuard>,
}

impl RegisterSessionHandler {
    pub fn new(guard: Arc<SessionGuard>) -> Self {
        Self { guard }
    }

    pub async fn handle(
        &self,
        cmd: RegisterSessionCommand,
    ) -> Result<RegisterSessionResult, HandlerError> {
        let device_info = cmd
            .device_info
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let session = self
            .guard
            .register(&cmd.user_id, device_info, Timestamp::now())
            .await?;

        tracing::info!(user_id = %cmd.user_id, "Session registered");
        Ok(RegisterSessionResult { session })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySessionStore;

    #[tokio::test]
    async fn new_login_replaces_previous_session() {
        let store = Arc::new(InMemorySessionStore::new());
        let handler = RegisterSessionHandler::new(Arc::new(SessionGuard::new(store.clone())));
        let user = UserId::new("u1").unwrap();

        let first = handler
            .handle(RegisterSessionCommand {
                user_id: user.clone(),
                device_info: Some("Firefox".into()),
            })
            .await
            .unwrap();
        let second = handler
            .handle(RegisterSessionCommand {
                user_id: user,
                device_info: None,
            })
            .await
            .unwrap();

        assert_ne!(first.session.token, second.session.token);
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn blank_device_info_is_dropped() {
        let store = Arc::new(InMemorySessionStore::new());
        let handler = RegisterSessionHandler::new(Arc::new(SessionGuard::new(store)));

        let result = handler
            .handle(RegisterSessionCommand {
                user_id: UserId::new("u1").unwrap(),
                device_info: Some("   ".into()),
            })
            .await
            .unwrap();

        assert_eq!(result.session.device_info, None);
    }
}
