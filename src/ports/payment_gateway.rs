//! Payment gateway port.
//!
//! Creates hosted checkouts (one-time preferences and recurring
//! preapprovals) and looks up the authoritative state of payments and
//! preapprovals by id. Notifications only ever carry ids; everything the
//! settlement path trusts comes through this port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, Money, PaymentId, PreapprovalId, Timestamp};

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Fetches a one-time payment.
    async fn get_payment(&self, payment_id: &PaymentId) -> Result<GatewayPayment, GatewayError>;

    /// Creates a hosted checkout for a single item.
    async fn create_preference(
        &self,
        request: PreferenceRequest,
    ) -> Result<HostedCheckout, GatewayError>;

    /// Creates a monthly recurring preapproval.
    async fn create_preapproval(
        &self,
        request: PreapprovalRequest,
    ) -> Result<HostedCheckout, GatewayError>;

    /// Fetches a preapproval's current status.
    async fn get_preapproval(
        &self,
        preapproval_id: &PreapprovalId,
    ) -> Result<GatewayPreapproval, GatewayError>;

    /// Fetches one recurring charge of a preapproval.
    async fn get_authorized_payment(
        &self,
        payment_id: &PaymentId,
    ) -> Result<GatewayAuthorizedPayment, GatewayError>;

    /// True when talking to the gateway's test environment.
    fn is_sandbox(&self) -> bool;
}

/// Authoritative view of a one-time payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayPayment {
    pub id: String,
    /// `approved`, `rejected`, `cancelled`, `pending`, `in_process`, ...
    pub status: String,
    pub status_detail: Option<String>,
    pub external_reference: Option<String>,
    pub transaction_amount: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayPreapproval {
    pub id: String,
    /// `pending`, `authorized`, `paused`, `cancelled`.
    pub status: String,
    pub external_reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayAuthorizedPayment {
    pub id: String,
    pub preapproval_id: String,
    /// Status of the underlying charge; `approved` extends the period.
    pub payment_status: Option<String>,
    pub transaction_amount: Option<Money>,
}

/// How the buyer pays. Drives price and excluded payment types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Pix,
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Pix => "pix",
            PaymentMethod::Card => "card",
        }
    }

    /// Gateway payment types hidden from the hosted checkout.
    ///
    /// The test environment has no PIX, so sandbox PIX checkouts keep cards
    /// available.
    pub fn excluded_payment_types(&self, sandbox: bool) -> &'static [&'static str] {
        match (self, sandbox) {
            (PaymentMethod::Pix, false) => {
                &["ticket", "credit_card", "debit_card", "atm", "prepaid_card"]
            }
            (PaymentMethod::Pix, true) => &["ticket"],
            (PaymentMethod::Card, _) => &["ticket", "bank_transfer"],
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pix" => Ok(PaymentMethod::Pix),
            "card" => Ok(PaymentMethod::Card),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceRequest {
    pub title: String,
    pub unit_price: Money,
    pub currency: String,
    pub external_reference: String,
    pub method: PaymentMethod,
    pub back_urls: BackUrls,
    pub notification_url: String,
    /// Checkout link stops working after this instant.
    pub expires_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreapprovalRequest {
    pub reason: String,
    pub external_reference: String,
    pub payer_email: String,
    pub monthly_amount: Money,
    pub currency: String,
    pub back_url: String,
    pub notification_url: String,
}

/// Hosted checkout created at the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedCheckout {
    pub id: String,
    /// Production checkout URL.
    pub init_point: String,
    pub sandbox_init_point: Option<String>,
}

impl HostedCheckout {
    /// URL to send the buyer to.
    pub fn checkout_url(&self, sandbox: bool) -> &str {
        match (&self.sandbox_init_point, sandbox) {
            (Some(url), true) => url,
            _ => &self.init_point,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Gateway request timed out")]
    Timeout,

    #[error("Gateway unreachable: {0}")]
    Network(String),

    #[error("Gateway rejected credentials")]
    Authentication,

    #[error("Gateway resource not found: {0}")]
    NotFound(String),

    #[error("Gateway returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Unexpected gateway response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Timeout | GatewayError::Network(_) => true,
            GatewayError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<GatewayError> for DomainError {
    fn from(err: GatewayError) -> Self {
        DomainError::new(ErrorCode::GatewayError, err.to_string())
    }
}
