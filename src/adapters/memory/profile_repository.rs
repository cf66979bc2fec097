use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ReferralCode, UserId};
use crate::ports::{Profile, ProfileRepository};

#[derive(Default)]
pub struct InMemoryProfileRepository {
    profiles: RwLock<HashMap<UserId, Profile>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, profile: Profile) {
        self.profiles
            .write()
            .await
            .insert(profile.user_id.clone(), profile);
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find(&self, user_id: &UserId) -> Result<Option<Profile>, DomainError> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }

    async fn find_by_referral_code(
        &self,
        code: &ReferralCode,
    ) -> Result<Option<Profile>, DomainError> {
        Ok(self
            .profiles
            .read()
            .await
            .values()
            .find(|p| p.referral_code.as_ref() == Some(code))
            .cloned())
    }

    async fn set_vip(&self, user_id: &UserId, is_vip: bool) -> Result<bool, DomainError> {
        match self.profiles.write().await.get_mut(user_id) {
            Some(profile) => {
                profile.is_vip = is_vip;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
