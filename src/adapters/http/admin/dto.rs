//! HTTP DTOs for admin endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::access::CreateCouponCheckoutResult;
use crate::domain::access::AccessStatus;
use crate::domain::admin::{DeletionReport, IdentityDeletion, TableDeletion};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

impl std::fmt::Debug for ResetPasswordRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetPasswordRequest")
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetVipRequest {
    pub is_vip: bool,
}

/// Manual correction of one access entry.
#[derive(Debug, Clone, Deserialize)]
pub struct OverrideAccessRequest {
    pub user_id: String,
    pub subject_id: String,
    pub status: AccessStatus,
    pub group: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCouponRequest {
    pub user_id: String,
    pub subject_id: String,
    pub subject_label: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct DeleteUserResponse {
    pub user_id: String,
    /// False when any table or the identity account could not be removed.
    pub complete: bool,
    pub tables: Vec<TableDeletion>,
    pub identity: IdentityDeletion,
}

impl From<DeletionReport> for DeleteUserResponse {
    fn from(report: DeletionReport) -> Self {
        Self {
            user_id: report.user_id.as_str().to_string(),
            complete: report.is_complete(),
            tables: report.tables,
            identity: report.identity,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CouponResponse {
    pub checkout_url: String,
    pub price: f64,
    pub expires_at: String,
}

impl From<CreateCouponCheckoutResult> for CouponResponse {
    fn from(result: CreateCouponCheckoutResult) -> Self {
        Self {
            checkout_url: result.checkout_url,
            price: result.price.as_decimal(),
            expires_at: result.expires_at.to_rfc3339(),
        }
    }
}
