//! HeartbeatHandler - Keeps a session alive or reports its eviction.

use std::sync::Arc;

use crate::application::handlers::HandlerError;
use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::session::SessionGuard;

#[derive(Debug, Clone)]
pub struct HeartbeatCommand {
    pub user_id: UserId,
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatResult {
    /// False once another login evicted this session.
    pub valid: bool,
}

pub struct HeartbeatHandler {
    guard: Arc<SessionGuard>,
}

impl HeartbeatHandler {
    pub fn new(guard: Arc<SessionGuard>) -> Self {
        Self { guard }
    }

    pub async fn handle(&self, cmd: HeartbeatCommand) -> Result<HeartbeatResult, HandlerError> {
        if cmd.token.trim().is_empty() {
            return Err(HandlerError::validation("token", "session token is required"));
        }
        let valid = self
            .guard
            .heartbeat(&cmd.user_id, &cmd.token, Timestamp::now())
            .await?;
        Ok(HeartbeatResult { valid })
    }
}
