//! EventLog port - append-only audit trail.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::settlement::EventRecord;

#[async_trait]
pub trait EventLog: Send + Sync {
    async fn append(&self, record: &EventRecord) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn _accepts_dyn(_log: &dyn EventLog) {}
}
