//! CancelPendingHandler - Command handler for abandoning a checkout.

use std::sync::Arc;

use crate::application::handlers::{EventRecorder, HandlerError};
use crate::domain::access::{AccessLedger, CancelDisposition};
use crate::domain::foundation::{SubjectId, Timestamp, UserId};
use crate::domain::settlement::AccessEvent;

#[derive(Debug, Clone)]
pub struct CancelPendingCommand {
    pub user_id: UserId,
    pub subject_id: SubjectId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelPendingResult {
    pub disposition: CancelDisposition,
}

/// Lets the user back out of a checkout. Remaining trial time is kept.
pub struct CancelPendingHandler {
    ledger: Arc<AccessLedger>,
    recorder: Arc<EventRecorder>,
}

impl CancelPendingHandler {
    pub fn new(ledger: Arc<AccessLedger>, recorder: Arc<EventRecorder>) -> Self {
        Self { ledger, recorder }
    }

    pub async fn handle(
        &self,
        cmd: CancelPendingCommand,
    ) -> Result<CancelPendingResult, HandlerError> {
        let now = Timestamp::now();
        let disposition = self
            .ledger
            .cancel_pending(&cmd.user_id, &cmd.subject_id, now)
            .await?;

        if disposition != CancelDisposition::NotPending {
            self.recorder
                .record(
                    Some(&cmd.user_id),
                    AccessEvent::PendingCancelled {
                        subject_id: cmd.subject_id,
                        reverted_to_trial: disposition == CancelDisposition::RevertToTrial,
                    },
                    now,
                )
                .await;
        }

        Ok(CancelPendingResult { disposition })
    }
}
