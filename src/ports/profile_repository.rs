//! ProfileRepository port for the user profile row.
//!
//! Admin and VIP flags are authorization inputs; they are read from here on
//! every request, never from the bearer token.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ReferralCode, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub user_id: UserId,
    pub email: Option<String>,
    pub name: Option<String>,
    /// Affiliate code this user signed up with.
    pub referred_by: Option<ReferralCode>,
    /// This user's own affiliate code.
    pub referral_code: Option<ReferralCode>,
    pub is_admin: bool,
    pub is_vip: bool,
}

impl Profile {
    /// First word of the name, for greetings.
    pub fn first_name(&self) -> Option<&str> {
        self.name.as_deref().and_then(|n| n.split_whitespace().next())
    }
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find(&self, user_id: &UserId) -> Result<Option<Profile>, DomainError>;

    async fn find_by_referral_code(
        &self,
        code: &ReferralCode,
    ) -> Result<Option<Profile>, DomainError>;

    /// Returns false if no profile exists.
    async fn set_vip(&self, user_id: &UserId, is_vip: bool) -> Result<bool, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn _accepts_dyn(_repo: &dyn ProfileRepository) {}

    #[test]
    fn first_name_takes_first_word() {
        let profile = Profile {
            user_id: UserId::new("u").unwrap(),
            email: None,
            name: Some("  Ana Maria Souza".into()),
            referred_by: None,
            referral_code: None,
            is_admin: false,
            is_vip: false,
        };
        assert_eq!(profile.first_name(), Some("Ana"));
    }
}
