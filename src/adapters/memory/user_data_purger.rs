use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::admin::UserDataTable;
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::UserDataPurger;

#[derive(Default)]
struct State {
    calls: Vec<(UserDataTable, UserId)>,
    failing: HashSet<UserDataTable>,
}

/// Records purge calls; selected tables can be made to fail.
#[derive(Default)]
pub struct InMemoryUserDataPurger {
    state: Mutex<State>,
}

impl InMemoryUserDataPurger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_table(&self, table: UserDataTable) {
        self.state.lock().await.failing.insert(table);
    }

    pub async fn calls(&self) -> Vec<(UserDataTable, UserId)> {
        self.state.lock().await.calls.clone()
    }
}

#[async_trait]
impl UserDataPurger for InMemoryUserDataPurger {
    async fn purge(&self, table: UserDataTable, user_id: &UserId) -> Result<u64, DomainError> {
        let mut state = self.state.lock().await;
        state.calls.push((table, user_id.clone()));
        if state.failing.contains(&table) {
            return Err(DomainError::database(format!(
                "simulated failure deleting {}",
                table.as_str()
            )));
        }
        Ok(1)
    }
}
