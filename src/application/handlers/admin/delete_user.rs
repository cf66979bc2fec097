//! DeleteUserHandler - Admin removal of a user's data and login.
//!
//! Tables are cleared in `UserDataTable::DELETION_ORDER`. A failing table is
//! recorded and the rest still run. The identity provider user goes last and
//! its failure is reported separately: the data is gone but the login is not.

use std::sync::Arc;

use crate::application::handlers::HandlerError;
use crate::domain::admin::{DeletionReport, IdentityDeletion, TableDeletion, UserDataTable};
use crate::domain::foundation::UserId;
use crate::ports::{IdentityAdmin, ProfileRepository, UserDataPurger};

use super::require_admin;

#[derive(Debug, Clone)]
pub struct DeleteUserCommand {
    pub admin_id: UserId,
    pub target_user_id: UserId,
}

pub struct DeleteUserHandler {
    profiles: Arc<dyn ProfileRepository>,
    purger: Arc<dyn UserDataPurger>,
    identity: Arc<dyn IdentityAdmin>,
}

impl DeleteUserHandler {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        purger: Arc<dyn UserDataPurger>,
        identity: Arc<dyn IdentityAdmin>,
    ) -> Self {
        Self {
            profiles,
            purger,
            identity,
        }
    }

    pub async fn handle(&self, cmd: DeleteUserCommand) -> Result<DeletionReport, HandlerError> {
        // 1. Admins only, and never themselves
        require_admin(self.profiles.as_ref(), &cmd.admin_id).await?;
        if cmd.admin_id == cmd.target_user_id {
            return Err(HandlerError::validation(
                "user_id",
                "admins cannot delete their own account",
            ));
        }

        // 2. Data tables, each independently
        let mut tables = Vec::with_capacity(UserDataTable::DELETION_ORDER.len());
        for table in UserDataTable::DELETION_ORDER {
            let outcome = match self.purger.purge(table, &cmd.target_user_id).await {
                Ok(deleted) => TableDeletion::succeeded(table, deleted),
                Err(err) => {
                    tracing::error!(
                        user_id = %cmd.target_user_id,
                        table = table.as_str(),
                        error = %err,
                        "Failed to delete user data"
                    );
                    TableDeletion::failed(table, err.to_string())
                }
            };
            tables.push(outcome);
        }

        // 3. Identity provider login
        let identity = match self.identity.delete_user(&cmd.target_user_id).await {
            Ok(()) => IdentityDeletion::Deleted,
            Err(err) => {
                tracing::error!(
                    user_id = %cmd.target_user_id,
                    error = %err,
                    "Failed to delete identity provider user"
                );
                IdentityDeletion::Failed(err.to_string())
            }
        };

        let report = DeletionReport {
            user_id: cmd.target_user_id,
            tables,
            identity,
        };

        tracing::info!(
            admin_id = %cmd.admin_id,
            user_id = %report.user_id,
            complete = report.is_complete(),
            failed_tables = report.failed_tables().len(),
            "User deletion finished"
        );

        Ok(report)
    }
}
