//! HTTP DTOs for access, checkout and subscription endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::access::{
    AccessOverview, CreateCheckoutResult, SubjectAccess,
};
use crate::application::handlers::subscription::CreateSubscriptionResult;
use crate::domain::access::{AccessEntry, AccessStatus, CancelDisposition};
use crate::ports::PaymentMethod;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to start the caller's one trial.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivateTrialRequest {
    pub subject_id: String,
    pub group: i32,
}

/// Request to start a one-time checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCheckoutRequest {
    pub subject_id: String,
    /// Display name shown on the gateway page, e.g. "Pediatria".
    pub subject_label: String,
    pub group: i32,
    /// `pix` (default) or `card`.
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct SubjectAccessResponse {
    pub subject_id: String,
    pub group: u8,
    pub status: AccessStatus,
    /// ISO 8601, only while a trial is or was running.
    pub trial_expires_at: Option<String>,
    pub has_access: bool,
}

impl From<SubjectAccess> for SubjectAccessResponse {
    fn from(entry: SubjectAccess) -> Self {
        Self {
            subject_id: entry.subject_id.as_str().to_string(),
            group: entry.group.value(),
            status: entry.status,
            trial_expires_at: entry.trial_expires_at.map(|t| t.to_rfc3339()),
            has_access: entry.has_access,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessOverviewResponse {
    pub entries: Vec<SubjectAccessResponse>,
    pub has_access: bool,
    pub has_used_trial: bool,
    pub active_trial: Option<String>,
    pub is_subscriber: bool,
    pub is_vip: bool,
    pub window_open: bool,
    pub module_end_date: String,
}

impl From<AccessOverview> for AccessOverviewResponse {
    fn from(overview: AccessOverview) -> Self {
        Self {
            entries: overview.entries.into_iter().map(Into::into).collect(),
            has_access: overview.has_access,
            has_used_trial: overview.has_used_trial,
            active_trial: overview.active_trial.map(|s| s.as_str().to_string()),
            is_subscriber: overview.is_subscriber,
            is_vip: overview.is_vip,
            window_open: overview.window_open,
            module_end_date: overview.module_end_date.to_rfc3339(),
        }
    }
}

/// One access entry after a write.
#[derive(Debug, Clone, Serialize)]
pub struct AccessEntryResponse {
    pub user_id: String,
    pub subject_id: String,
    pub group: u8,
    pub status: AccessStatus,
    pub trial_expires_at: Option<String>,
    pub updated_at: String,
}

impl From<AccessEntry> for AccessEntryResponse {
    fn from(entry: AccessEntry) -> Self {
        Self {
            user_id: entry.user_id.as_str().to_string(),
            subject_id: entry.subject_id.as_str().to_string(),
            group: entry.group.value(),
            status: entry.status,
            trial_expires_at: entry.trial_expires_at.map(|t| t.to_rfc3339()),
            updated_at: entry.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
    pub preference_id: String,
    pub price: f64,
    pub sandbox: bool,
}

impl From<CreateCheckoutResult> for CheckoutResponse {
    fn from(result: CreateCheckoutResult) -> Self {
        Self {
            checkout_url: result.checkout_url,
            preference_id: result.preference_id,
            price: result.price.as_decimal(),
            sandbox: result.sandbox,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelPendingOutcome {
    RevertedToTrial,
    Removed,
    NothingPending,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelPendingResponse {
    pub outcome: CancelPendingOutcome,
}

impl From<CancelDisposition> for CancelPendingResponse {
    fn from(disposition: CancelDisposition) -> Self {
        let outcome = match disposition {
            CancelDisposition::RevertToTrial => CancelPendingOutcome::RevertedToTrial,
            CancelDisposition::Delete => CancelPendingOutcome::Removed,
            CancelDisposition::NotPending => CancelPendingOutcome::NothingPending,
        };
        Self { outcome }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionCheckoutResponse {
    pub checkout_url: String,
    pub preapproval_id: String,
}

impl From<CreateSubscriptionResult> for SubscriptionCheckoutResponse {
    fn from(result: CreateSubscriptionResult) -> Self {
        Self {
            checkout_url: result.checkout_url,
            preapproval_id: result.preapproval_id.as_str().to_string(),
        }
    }
}
