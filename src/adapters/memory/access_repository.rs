//! In-memory access repository.
//!
//! Mirrors the Postgres semantics: unique (user, subject), version
//! compare-and-swap on every write, and the trial grant written in the same
//! critical section as its entry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::access::{AccessEntry, TrialGrant};
use crate::domain::foundation::{DomainError, ErrorCode, SubjectId, UserId};
use crate::ports::AccessRepository;

type Key = (UserId, SubjectId);

#[derive(Default)]
struct State {
    entries: HashMap<Key, AccessEntry>,
    grants: Vec<TrialGrant>,
}

#[derive(Default)]
pub struct InMemoryAccessRepository {
    state: Mutex<State>,
    fail_writes: AtomicBool,
}

impl InMemoryAccessRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write fail with a database error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn entry_count(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn grant_count(&self) -> usize {
        self.state.lock().await.grants.len()
    }

    /// Stores an entry as-is, bypassing version checks.
    pub async fn seed(&self, mut entry: AccessEntry) {
        entry.version = entry.version.max(1);
        let key = (entry.user_id.clone(), entry.subject_id.clone());
        self.state.lock().await.entries.insert(key, entry);
    }

    pub async fn seed_grant(&self, grant: TrialGrant) {
        self.state.lock().await.grants.push(grant);
    }

    fn check_writable(&self) -> Result<(), DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::database("simulated write failure"));
        }
        Ok(())
    }
}

fn key_of(entry: &AccessEntry) -> Key {
    (entry.user_id.clone(), entry.subject_id.clone())
}

/// Applies the insert-or-CAS rule to `entries`.
fn write_entry(entries: &mut HashMap<Key, AccessEntry>, entry: &AccessEntry) -> Result<(), DomainError> {
    let key = key_of(entry);
    match (entries.get(&key), entry.version) {
        (None, 0) => {}
        (Some(_), 0) => {
            return Err(DomainError::concurrent_modification(
                "access entry already exists",
            ))
        }
        (Some(stored), v) if stored.version == v => {}
        _ => {
            return Err(DomainError::concurrent_modification(
                "access entry version changed",
            ))
        }
    }
    let mut stored = entry.clone();
    stored.version += 1;
    entries.insert(key, stored);
    Ok(())
}

#[async_trait]
impl AccessRepository for InMemoryAccessRepository {
    async fn find(
        &self,
        user_id: &UserId,
        subject_id: &SubjectId,
    ) -> Result<Option<AccessEntry>, DomainError> {
        let state = self.state.lock().await;
        Ok(state
            .entries
            .get(&(user_id.clone(), subject_id.clone()))
            .cloned())
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<AccessEntry>, DomainError> {
        let state = self.state.lock().await;
        let mut entries: Vec<AccessEntry> = state
            .entries
            .values()
            .filter(|e| &e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.subject_id.cmp(&b.subject_id));
        Ok(entries)
    }

    async fn save(&self, entry: &AccessEntry) -> Result<(), DomainError> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        write_entry(&mut state.entries, entry)
    }

    async fn save_with_trial_grant(
        &self,
        entry: &AccessEntry,
        grant: &TrialGrant,
    ) -> Result<(), DomainError> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        if state.grants.iter().any(|g| g.user_id == grant.user_id) {
            return Err(DomainError::new(
                ErrorCode::TrialAlreadyUsed,
                "user already received a trial",
            ));
        }
        write_entry(&mut state.entries, entry)?;
        state.grants.push(grant.clone());
        Ok(())
    }

    async fn delete(&self, entry: &AccessEntry) -> Result<(), DomainError> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        let key = key_of(entry);
        match state.entries.get(&key) {
            Some(stored) if stored.version == entry.version => {
                state.entries.remove(&key);
                Ok(())
            }
            _ => Err(DomainError::concurrent_modification(
                "access entry version changed",
            )),
        }
    }

    async fn trial_grants(&self, user_id: &UserId) -> Result<Vec<TrialGrant>, DomainError> {
        let state = self.state.lock().await;
        Ok(state
            .grants
            .iter()
            .filter(|g| &g.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{GroupNumber, Timestamp};

    fn entry() -> AccessEntry {
        AccessEntry::new_pending(
            UserId::new("u").unwrap(),
            SubjectId::new("cm").unwrap(),
            GroupNumber::new(1).unwrap(),
            None,
            Timestamp::now(),
        )
    }

    #[tokio::test]
    async fn insert_then_stale_write_conflicts() {
        let repo = InMemoryAccessRepository::new();
        let fresh = entry();
        repo.save(&fresh).await.unwrap();

        let err = repo.save(&fresh).await.unwrap_err();
        assert!(err.is_concurrent_modification());

        let stored = repo.find(&fresh.user_id, &fresh.subject_id).await.unwrap().unwrap();
        assert_eq!(stored.version, 1);
        repo.save(&stored).await.unwrap();
    }

    #[tokio::test]
    async fn delete_requires_current_version() {
        let repo = InMemoryAccessRepository::new();
        repo.save(&entry()).await.unwrap();

        assert!(repo.delete(&entry()).await.is_err());
        let stored = repo
            .find(&entry().user_id, &entry().subject_id)
            .await
            .unwrap()
            .unwrap();
        repo.delete(&stored).await.unwrap();
        assert_eq!(repo.entry_count().await, 0);
    }

    #[tokio::test]
    async fn failing_writes_leave_state_untouched() {
        let repo = InMemoryAccessRepository::new();
        repo.fail_writes(true);
        assert!(repo.save(&entry()).await.is_err());
        assert_eq!(repo.entry_count().await, 0);
    }
}
