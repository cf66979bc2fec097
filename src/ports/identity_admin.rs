//! IdentityAdmin port - privileged calls against the identity provider.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};

#[async_trait]
pub trait IdentityAdmin: Send + Sync {
    /// Removes the login. A missing user is not an error.
    async fn delete_user(&self, user_id: &UserId) -> Result<(), DomainError>;

    async fn set_password(&self, user_id: &UserId, password: &str) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn _accepts_dyn(_admin: &dyn IdentityAdmin) {}
}
