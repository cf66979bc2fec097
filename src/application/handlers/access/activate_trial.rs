//! ActivateTrialHandler - Command handler for the one-time free trial.

use std::sync::Arc;

use crate::domain::access::{AccessEntry, AccessLedger};
use crate::domain::foundation::{GroupNumber, SubjectId, Timestamp, UserId};
use crate::domain::settlement::AccessEvent;

use crate::application::handlers::{EventRecorder, HandlerError};

/// Command to start the caller's trial on a subject.
#[derive(Debug, Clone)]
pub struct ActivateTrialCommand {
    pub user_id: UserId,
    pub subject_id: SubjectId,
    pub group: GroupNumber,
}

#[derive(Debug, Clone)]
pub struct ActivateTrialResult {
    pub entry: AccessEntry,
}

/// Handler for trial activation.
///
/// Trials are one per user for life, across every subject. The ledger
/// checks the grant table and writes the grant together with the entry.
pub struct ActivateTrialHandler {
    ledger: Arc<AccessLedger>,
    recorder: Arc<EventRecorder>,
}

impl ActivateTrialHandler {
    pub fn new(ledger: Arc<AccessLedger>, recorder: Arc<EventRecorder>) -> Self {
        Self { ledger, recorder }
    }

    pub async fn handle(
        &self,
        cmd: ActivateTrialCommand,
    ) -> Result<ActivateTrialResult, HandlerError> {
        let now = Timestamp::now();

        // 1. Grant the trial
        let entry = self
            .ledger
            .activate_trial(&cmd.user_id, &cmd.subject_id, cmd.group, now)
            .await?;

        // 2. Audit
        if let Some(expires_at) = entry.trial_expires_at {
            self.recorder
                .record(
                    Some(&cmd.user_id),
                    AccessEvent::TrialActivated {
                        subject_id: cmd.subject_id.clone(),
                        group: cmd.group,
                        expires_at,
                    },
                    now,
                )
                .await;
        }

        Ok(ActivateTrialResult { entry })
    }
}
