use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::foundation::DomainError;
use crate::domain::settlement::EventRecord;
use crate::ports::EventLog;

/// Captures events for assertions.
#[derive(Default)]
pub struct InMemoryEventLog {
    records: Mutex<Vec<EventRecord>>,
    fail: AtomicBool,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_appends(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn records(&self) -> Vec<EventRecord> {
        self.records.lock().await.clone()
    }

    /// Event kinds in append order.
    pub async fn kinds(&self) -> Vec<&'static str> {
        self.records
            .lock()
            .await
            .iter()
            .map(|r| r.event.kind())
            .collect()
    }

    pub async fn count_of(&self, kind: &str) -> usize {
        self.records
            .lock()
            .await
            .iter()
            .filter(|r| r.event.kind() == kind)
            .count()
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn append(&self, record: &EventRecord) -> Result<(), DomainError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DomainError::database("simulated event log failure"));
        }
        self.records.lock().await.push(record.clone());
        Ok(())
    }
}
