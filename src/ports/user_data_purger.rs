//! UserDataPurger port - per-table deletion of a user's rows.

use async_trait::async_trait;

use crate::domain::admin::UserDataTable;
use crate::domain::foundation::{DomainError, UserId};

#[async_trait]
pub trait UserDataPurger: Send + Sync {
    /// Deletes the user's rows from one table, returning the row count.
    ///
    /// Each call stands alone; callers decide what to do on failure.
    async fn purge(&self, table: UserDataTable, user_id: &UserId) -> Result<u64, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn _accepts_dyn(_purger: &dyn UserDataPurger) {}
}
