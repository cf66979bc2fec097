//! SetVipHandler - Toggles the VIP flag on a profile.

use std::sync::Arc;

use crate::application::handlers::{EventRecorder, HandlerError};
use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::settlement::AccessEvent;
use crate::ports::ProfileRepository;

use super::require_admin;

#[derive(Debug, Clone)]
pub struct SetVipCommand {
    pub admin_id: UserId,
    pub target_user_id: UserId,
    pub is_vip: bool,
}

pub struct SetVipHandler {
    profiles: Arc<dyn ProfileRepository>,
    recorder: Arc<EventRecorder>,
}

impl SetVipHandler {
    pub fn new(profiles: Arc<dyn ProfileRepository>, recorder: Arc<EventRecorder>) -> Self {
        Self { profiles, recorder }
    }

    pub async fn handle(&self, cmd: SetVipCommand) -> Result<(), HandlerError> {
        require_admin(self.profiles.as_ref(), &cmd.admin_id).await?;

        if !self.profiles.set_vip(&cmd.target_user_id, cmd.is_vip).await? {
            return Err(HandlerError::NotFound(format!(
                "Profile {}",
                cmd.target_user_id
            )));
        }

        tracing::info!(
            admin_id = %cmd.admin_id,
            user_id = %cmd.target_user_id,
            is_vip = cmd.is_vip,
            "VIP flag updated"
        );
        self.recorder
            .record(
                Some(&cmd.target_user_id),
                AccessEvent::VipChanged {
                    is_vip: cmd.is_vip,
                    admin_id: cmd.admin_id,
                },
                Timestamp::now(),
            )
            .await;
        Ok(())
    }
}
