//! Session admission guard.
//!
//! At most `max_sessions` live sessions per user. A new login evicts the
//! oldest ones; the evicted device learns about it on its next heartbeat.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::ports::SessionStore;

use super::SessionToken;

pub const MAX_SESSIONS: usize = 1;
pub const STALE_AFTER_MINUTES: i64 = 10;

pub struct SessionGuard {
    store: Arc<dyn SessionStore>,
    max_sessions: usize,
    stale_after_minutes: i64,
}

impl SessionGuard {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self::with_limits(store, MAX_SESSIONS, STALE_AFTER_MINUTES)
    }

    pub fn with_limits(
        store: Arc<dyn SessionStore>,
        max_sessions: usize,
        stale_after_minutes: i64,
    ) -> Self {
        Self {
            store,
            max_sessions: max_sessions.max(1),
            stale_after_minutes,
        }
    }

    /// Admits a new session and evicts older ones beyond the limit.
    ///
    /// Reaping stale sessions of other users is opportunistic; its failure
    /// does not fail the login.
    pub async fn register(
        &self,
        user_id: &UserId,
        device_info: Option<String>,
        now: Timestamp,
    ) -> Result<SessionToken, DomainError> {
        let session = SessionToken::issue(user_id.clone(), device_info, now);
        let evicted = self
            .store
            .insert_and_trim(&session, self.max_sessions)
            .await?;

        if evicted > 0 {
            tracing::info!(user_id = %user_id, evicted, "Older sessions evicted");
        }

        let cutoff = now.minus_minutes(self.stale_after_minutes);
        match self.store.reap_stale(cutoff).await {
            Ok(0) => {}
            Ok(reaped) => tracing::debug!(reaped, "Stale sessions reaped"),
            Err(err) => tracing::warn!(error = %err, "Failed to reap stale sessions"),
        }

        Ok(session)
    }

    /// False means the session is gone and the client must log out.
    pub async fn heartbeat(
        &self,
        user_id: &UserId,
        token: &str,
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        let valid = self.store.touch(user_id, token, now).await?;
        if !valid {
            tracing::info!(user_id = %user_id, "Heartbeat for unknown session");
        }
        Ok(valid)
    }

    /// Idempotent.
    pub async fn end_session(&self, token: &str) -> Result<(), DomainError> {
        self.store.delete(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySessionStore;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn guard() -> (SessionGuard, Arc<InMemorySessionStore>) {
        let store = Arc::new(InMemorySessionStore::new());
        (SessionGuard::new(store.clone()), store)
    }

    #[tokio::test]
    async fn second_login_evicts_first() {
        let (guard, _) = guard();
        let now = Timestamp::now();
        let first = guard.register(&user("u"), None, now).await.unwrap();
        let second = guard.register(&user("u"), None, now).await.unwrap();

        assert!(!guard.heartbeat(&user("u"), &first.token, now).await.unwrap());
        assert!(guard.heartbeat(&user("u"), &second.token, now).await.unwrap());
    }

    #[tokio::test]
    async fn other_users_are_not_evicted() {
        let (guard, _) = guard();
        let now = Timestamp::now();
        let a = guard.register(&user("a"), None, now).await.unwrap();
        guard.register(&user("b"), None, now).await.unwrap();

        assert!(guard.heartbeat(&user("a"), &a.token, now).await.unwrap());
    }

    #[tokio::test]
    async fn heartbeat_requires_matching_user() {
        let (guard, _) = guard();
        let now = Timestamp::now();
        let a = guard.register(&user("a"), None, now).await.unwrap();

        assert!(!guard.heartbeat(&user("b"), &a.token, now).await.unwrap());
    }

    #[tokio::test]
    async fn stale_sessions_are_reaped_on_register() {
        let (guard, store) = guard();
        let old = Timestamp::now();
        guard.register(&user("idle"), None, old).await.unwrap();

        guard.register(&user("fresh"), None, old.add_hours(1)).await.unwrap();

        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn end_session_is_idempotent() {
        let (guard, _) = guard();
        let now = Timestamp::now();
        let s = guard.register(&user("u"), None, now).await.unwrap();

        guard.end_session(&s.token).await.unwrap();
        guard.end_session(&s.token).await.unwrap();
        assert!(!guard.heartbeat(&user("u"), &s.token, now).await.unwrap());
    }

    #[tokio::test]
    async fn limit_above_one_keeps_newest() {
        let store = Arc::new(InMemorySessionStore::new());
        let guard = SessionGuard::with_limits(store.clone(), 2, STALE_AFTER_MINUTES);
        let now = Timestamp::now();
        let first = guard.register(&user("u"), None, now).await.unwrap();
        let second = guard.register(&user("u"), None, now).await.unwrap();
        let third = guard.register(&user("u"), None, now).await.unwrap();

        assert!(!guard.heartbeat(&user("u"), &first.token, now).await.unwrap());
        assert!(guard.heartbeat(&user("u"), &second.token, now).await.unwrap());
        assert!(guard.heartbeat(&user("u"), &third.token, now).await.unwrap());
    }
}
