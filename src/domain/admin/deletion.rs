//! Account deletion.
//!
//! User data lives in several tables. Each table is cleared independently and
//! its outcome recorded; one failure never stops the rest. The identity
//! provider account is removed last and reported separately.

use serde::Serialize;

use crate::domain::foundation::{UserId, ValidationError};

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Tables holding per-user rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserDataTable {
    CommissionsAsAffiliate,
    CommissionsAsReferred,
    Sessions,
    Progress,
    Access,
    SupportTickets,
    Events,
    Profile,
}

impl UserDataTable {
    /// Deletion order. Dependents before the profile row.
    pub const DELETION_ORDER: [UserDataTable; 8] = [
        UserDataTable::CommissionsAsAffiliate,
        UserDataTable::CommissionsAsReferred,
        UserDataTable::Sessions,
        UserDataTable::Progress,
        UserDataTable::Access,
        UserDataTable::SupportTickets,
        UserDataTable::Events,
        UserDataTable::Profile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserDataTable::CommissionsAsAffiliate => "commissions_as_affiliate",
            UserDataTable::CommissionsAsReferred => "commissions_as_referred",
            UserDataTable::Sessions => "sessions",
            UserDataTable::Progress => "progress",
            UserDataTable::Access => "access",
            UserDataTable::SupportTickets => "support_tickets",
            UserDataTable::Events => "events",
            UserDataTable::Profile => "profile",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDeletion {
    pub table: UserDataTable,
    pub deleted: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TableDeletion {
    pub fn succeeded(table: UserDataTable, deleted: u64) -> Self {
        Self {
            table,
            deleted: Some(deleted),
            error: None,
        }
    }

    pub fn failed(table: UserDataTable, error: impl Into<String>) -> Self {
        Self {
            table,
            deleted: None,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum IdentityDeletion {
    Deleted,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    pub user_id: UserId,
    pub tables: Vec<TableDeletion>,
    pub identity: IdentityDeletion,
}

impl DeletionReport {
    pub fn failed_tables(&self) -> Vec<UserDataTable> {
        self.tables
            .iter()
            .filter(|t| !t.is_ok())
            .map(|t| t.table)
            .collect()
    }

    /// Data rows are gone but the login still exists.
    pub fn identity_failed(&self) -> bool {
        matches!(self.identity, IdentityDeletion::Failed(_))
    }

    pub fn is_complete(&self) -> bool {
        !self.identity_failed() && self.tables.iter().all(TableDeletion::is_ok)
    }
}

pub fn validate_new_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::invalid_format(
            "password",
            format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
        ));
    }
    Ok(())
}
