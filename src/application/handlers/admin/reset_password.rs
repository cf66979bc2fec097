//! ResetPasswordHandler - Admin sets a user's password at the identity provider.

use std::sync::Arc;

use crate::application::handlers::HandlerError;
use crate::domain::admin::validate_new_password;
use crate::domain::foundation::UserId;
use crate::ports::{IdentityAdmin, ProfileRepository};

use super::require_admin;

#[derive(Clone)]
pub struct ResetPasswordCommand {
    pub admin_id: UserId,
    pub target_user_id: UserId,
    pub new_password: String,
}

impl std::fmt::Debug for ResetPasswordCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetPasswordCommand")
            .field("admin_id", &self.admin_id)
            .field("target_user_id", &self.target_user_id)
            .field("new_password", &"[REDACTED]")
            .finish()
    }
}

pub struct ResetPasswordHandler {
    profiles: Arc<dyn ProfileRepository>,
    identity: Arc<dyn IdentityAdmin>,
}

impl ResetPasswordHandler {
    pub fn new(profiles: Arc<dyn ProfileRepository>, identity: Arc<dyn IdentityAdmin>) -> Self {
        Self { profiles, identity }
    }

    pub async fn handle(&self, cmd: ResetPasswordCommand) -> Result<(), HandlerError> {
        require_admin(self.profiles.as_ref(), &cmd.admin_id).await?;
        validate_new_password(&cmd.new_password)?;

        self.identity
            .set_password(&cmd.target_user_id, &cmd.new_password)
            .await?;

        tracing::info!(
            admin_id = %cmd.admin_id,
            user_id = %cmd.target_user_id,
            "Password reset by admin"
        );
        Ok(())
    }
}
