//! EndSessionHandler - Logout.

use std::sync::Arc;

use crate::application::handlers::HandlerError;
use crate::domain::foundation::UserId;
use crate::domain::session::SessionGuard;

#[derive(Debug, Clone)]
pub struct EndSessionCommand {
    pub user_id: UserId,
    pub token: String,
}

pub struct EndSessionHandler {
    guard: Arc<SessionGuard>,
}

impl EndSessionHandler {
    pub fn new(guard: Arc<SessionGuard>) -> Self {
        Self { guard }
    }

    /// Ending an unknown or already-ended session succeeds.
    pub async fn handle(&self, cmd: EndSessionCommand) -> Result<(), HandlerError> {
        self.guard.end_session(&cmd.token).await?;
        tracing::info!(user_id = %cmd.user_id, "Session ended");
        Ok(())
    }
}
