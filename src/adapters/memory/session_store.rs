use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::session::SessionToken;
use crate::ports::SessionStore;

/// Sessions kept in insertion order, which stands in for creation order
/// when timestamps tie.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<Vec<SessionToken>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert_and_trim(&self, session: &SessionToken, keep: usize) -> Result<u64, DomainError> {
        let mut sessions = self.sessions.lock().await;
        sessions.push(session.clone());

        let owned: Vec<usize> = sessions
            .iter()
            .enumerate()
            .filter(|(_, s)| s.user_id == session.user_id)
            .map(|(i, _)| i)
            .collect();
        if owned.len() <= keep {
            return Ok(0);
        }

        let evict = owned.len() - keep;
        let doomed: Vec<usize> = owned.into_iter().take(evict).collect();
        let mut index = 0;
        sessions.retain(|_| {
            let keep_it = !doomed.contains(&index);
            index += 1;
            keep_it
        });
        Ok(evict as u64)
    }

    async fn touch(&self, user_id: &UserId, token: &str, now: Timestamp) -> Result<bool, DomainError> {
        let mut sessions = self.sessions.lock().await;
        match sessions
            .iter_mut()
            .find(|s| s.token == token && &s.user_id == user_id)
        {
            Some(session) => {
                session.last_seen_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, token: &str) -> Result<(), DomainError> {
        self.sessions.lock().await.retain(|s| s.token != token);
        Ok(())
    }

    async fn reap_stale(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|s| !s.is_stale(&cutoff));
        Ok((before - sessions.len()) as u64)
    }
}
