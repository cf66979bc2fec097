use crate::application::handlers::HandlerError;
use crate::domain::foundation::UserId;
use crate::ports::{Profile, ProfileRepository};

/// Loads the caller's profile and fails with `Forbidden` unless it is an admin.
///
/// The flag is read fresh from the profile table on every call.
pub async fn require_admin(
    profiles: &dyn ProfileRepository,
    user_id: &UserId,
) -> Result<Profile, HandlerError> {
    match profiles.find(user_id).await? {
        Some(profile) if profile.is_admin => Ok(profile),
        _ => {
            tracing::warn!(user_id = %user_id, "Non-admin attempted an admin operation");
            Err(HandlerError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryProfileRepository;

    fn profile(id: &str, is_admin: bool) -> Profile {
        Profile {
            user_id: UserId::new(id).unwrap(),
            email: None,
            name: None,
            referred_by: None,
            referral_code: None,
            is_admin,
            is_vip: false,
        }
    }

    #[tokio::test]
    async fn admin_passes() {
        let profiles = InMemoryProfileRepository::new();
        profiles.insert(profile("boss", true)).await;

        let found = require_admin(&profiles, &UserId::new("boss").unwrap()).await.unwrap();
        assert!(found.is_admin);
    }

    #[tokio::test]
    async fn regular_user_and_missing_profile_are_forbidden() {
        let profiles = InMemoryProfileRepository::new();
        profiles.insert(profile("pleb", false)).await;

        for id in ["pleb", "ghost"] {
            let err = require_admin(&profiles, &UserId::new(id).unwrap()).await.unwrap_err();
            assert_eq!(err, HandlerError::Forbidden);
        }
    }
}
