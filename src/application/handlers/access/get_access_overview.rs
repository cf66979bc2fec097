//! GetAccessOverviewHandler - Query handler for the caller's access state.
//!
//! Always reads the store of record. Nothing here is cached between calls.

use std::sync::Arc;

use serde::Serialize;

use crate::application::handlers::HandlerError;
use crate::domain::access::{AccessLedger, AccessStatus};
use crate::domain::foundation::{GroupNumber, SubjectId, Timestamp, UserId};
use crate::ports::{ProfileRepository, SubscriptionRepository};

#[derive(Debug, Clone)]
pub struct GetAccessOverviewQuery {
    pub user_id: UserId,
}

/// One subject as the frontend sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectAccess {
    pub subject_id: SubjectId,
    pub group: GroupNumber,
    pub status: AccessStatus,
    pub trial_expires_at: Option<Timestamp>,
    pub has_access: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessOverview {
    pub entries: Vec<SubjectAccess>,
    /// True if any subject is open to the caller right now.
    pub has_access: bool,
    pub has_used_trial: bool,
    /// Subject with a running trial, if any.
    pub active_trial: Option<SubjectId>,
    pub is_subscriber: bool,
    pub is_vip: bool,
    pub window_open: bool,
    pub module_end_date: Timestamp,
}

pub struct GetAccessOverviewHandler {
    ledger: Arc<AccessLedger>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

impl GetAccessOverviewHandler {
    pub fn new(
        ledger: Arc<AccessLedger>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        profiles: Arc<dyn ProfileRepository>,
    ) -> Self {
        Self {
            ledger,
            subscriptions,
            profiles,
        }
    }

    pub async fn handle(&self, query: GetAccessOverviewQuery) -> Result<AccessOverview, HandlerError> {
        let now = Timestamp::now();
        let policy = self.ledger.policy();

        let is_vip = self
            .profiles
            .find(&query.user_id)
            .await?
            .map_or(false, |p| p.is_vip);
        let is_subscriber = self
            .subscriptions
            .find_by_user(&query.user_id)
            .await?
            .map_or(false, |s| s.is_active(now));
        let window_open = policy.is_access_window_open(now, is_vip);

        let entries: Vec<SubjectAccess> = self
            .ledger
            .entries_for_user(&query.user_id)
            .await?
            .into_iter()
            .map(|entry| SubjectAccess {
                has_access: window_open && (is_subscriber || entry.grants_access(now)),
                subject_id: entry.subject_id.clone(),
                group: entry.group,
                status: entry.status,
                trial_expires_at: entry.trial_expires_at,
            })
            .collect();

        let active_trial = entries
            .iter()
            .find(|e| {
                e.status == AccessStatus::Trial
                    && e.trial_expires_at.map_or(false, |t| t.is_after(&now))
            })
            .map(|e| e.subject_id.clone());

        Ok(AccessOverview {
            has_access: window_open && (is_subscriber || entries.iter().any(|e| e.has_access)),
            has_used_trial: self.ledger.has_used_trial(&query.user_id).await?,
            active_trial,
            is_subscriber,
            is_vip,
            window_open,
            module_end_date: policy.module_end_date,
            entries,
        })
    }
}
