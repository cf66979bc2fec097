//! SessionStore port for admitted login sessions.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::session::SessionToken;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Inserts the session, then deletes all but the `keep` most recently
    /// created sessions of the same user, in one transaction.
    ///
    /// Returns how many sessions were evicted.
    async fn insert_and_trim(&self, session: &SessionToken, keep: usize) -> Result<u64, DomainError>;

    /// Updates `last_seen_at` for (user, token). False if no row matched.
    async fn touch(&self, user_id: &UserId, token: &str, now: Timestamp) -> Result<bool, DomainError>;

    /// Deletes by token. Missing rows are not an error.
    async fn delete(&self, token: &str) -> Result<(), DomainError>;

    /// Deletes sessions of any user last seen before `cutoff`.
    async fn reap_stale(&self, cutoff: Timestamp) -> Result<u64, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn _accepts_dyn(_store: &dyn SessionStore) {}
}
