//! OverrideAccessHandler - Admin sets an access entry's status directly.
//!
//! Bypasses the normal transition rules. Used by support to fix entries by
//! hand after a refund or a payment outside the gateway.

use std::sync::Arc;

use crate::application::handlers::{EventRecorder, HandlerError};
use crate::domain::access::{AccessEntry, AccessLedger, AccessStatus};
use crate::domain::foundation::{GroupNumber, SubjectId, Timestamp, UserId};
use crate::domain::settlement::AccessEvent;
use crate::ports::ProfileRepository;

use super::require_admin;

#[derive(Debug, Clone)]
pub struct OverrideAccessCommand {
    pub admin_id: UserId,
    pub target_user_id: UserId,
    pub subject_id: SubjectId,
    pub status: AccessStatus,
    pub group: GroupNumber,
}

pub struct OverrideAccessHandler {
    ledger: Arc<AccessLedger>,
    profiles: Arc<dyn ProfileRepository>,
    recorder: Arc<EventRecorder>,
}

impl OverrideAccessHandler {
    pub fn new(
        ledger: Arc<AccessLedger>,
        profiles: Arc<dyn ProfileRepository>,
        recorder: Arc<EventRecorder>,
    ) -> Self {
        Self {
            ledger,
            profiles,
            recorder,
        }
    }

    pub async fn handle(&self, cmd: OverrideAccessCommand) -> Result<AccessEntry, HandlerError> {
        require_admin(self.profiles.as_ref(), &cmd.admin_id).await?;
        let now = Timestamp::now();

        let entry = self
            .ledger
            .admin_override(&cmd.target_user_id, &cmd.subject_id, cmd.status, cmd.group, now)
            .await?;

        tracing::info!(
            admin_id = %cmd.admin_id,
            user_id = %cmd.target_user_id,
            subject_id = %cmd.subject_id,
            status = %cmd.status,
            "Access overridden by admin"
        );
        self.recorder
            .record(
                Some(&cmd.target_user_id),
                AccessEvent::AccessOverridden {
                    subject_id: cmd.subject_id,
                    status: cmd.status,
                    group: cmd.group,
                    admin_id: cmd.admin_id,
                },
                now,
            )
            .await;

        Ok(entry)
    }
}
