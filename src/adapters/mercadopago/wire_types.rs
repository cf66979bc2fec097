//! Mercado Pago request and response bodies.
//!
//! Only the fields this service reads or writes. Numeric ids arrive as JSON
//! numbers and are kept as strings on our side.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::Money;
use crate::ports::{
    GatewayAuthorizedPayment, GatewayPayment, GatewayPreapproval, HostedCheckout,
    PreapprovalRequest, PreferenceRequest,
};

// ════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
pub struct PreferenceBody {
    pub items: Vec<PreferenceItem>,
    pub external_reference: String,
    pub back_urls: BackUrlsBody,
    pub auto_return: &'static str,
    pub notification_url: String,
    pub payment_methods: PaymentMethodsBody,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub expires: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date_to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PreferenceItem {
    pub title: String,
    pub quantity: u32,
    pub currency_id: String,
    pub unit_price: Money,
}

#[derive(Debug, Serialize)]
pub struct BackUrlsBody {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentMethodsBody {
    pub excluded_payment_types: Vec<ExcludedType>,
}

#[derive(Debug, Serialize)]
pub struct ExcludedType {
    pub id: &'static str,
}

impl PreferenceBody {
    pub fn from_request(request: PreferenceRequest, sandbox: bool) -> Self {
        let excluded = request
            .method
            .excluded_payment_types(sandbox)
            .iter()
            .copied()
            .map(|id| ExcludedType { id })
            .collect();
        Self {
            items: vec![PreferenceItem {
                title: request.title,
                quantity: 1,
                currency_id: request.currency,
                unit_price: request.unit_price,
            }],
            external_reference: request.external_reference,
            back_urls: BackUrlsBody {
                success: request.back_urls.success,
                failure: request.back_urls.failure,
                pending: request.back_urls.pending,
            },
            auto_return: "approved",
            notification_url: request.notification_url,
            payment_methods: PaymentMethodsBody {
                excluded_payment_types: excluded,
            },
            expires: request.expires_at.is_some(),
            expiration_date_to: request.expires_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PreapprovalBody {
    pub reason: String,
    pub external_reference: String,
    pub payer_email: String,
    pub auto_recurring: AutoRecurring,
    pub back_url: String,
    pub notification_url: String,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AutoRecurring {
    pub frequency: u32,
    pub frequency_type: &'static str,
    pub transaction_amount: Money,
    pub currency_id: String,
}

impl From<PreapprovalRequest> for PreapprovalBody {
    fn from(request: PreapprovalRequest) -> Self {
        Self {
            reason: request.reason,
            external_reference: request.external_reference,
            payer_email: request.payer_email,
            auto_recurring: AutoRecurring {
                frequency: 1,
                frequency_type: "months",
                transaction_amount: request.monthly_amount,
                currency_id: request.currency,
            },
            back_url: request.back_url,
            notification_url: request.notification_url,
            status: "pending",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
pub struct CheckoutResponse {
    pub id: Value,
    pub init_point: Option<String>,
    pub sandbox_init_point: Option<String>,
}

impl CheckoutResponse {
    /// `None` when the gateway answered without an id or a checkout link.
    pub fn into_checkout(self) -> Option<HostedCheckout> {
        Some(HostedCheckout {
            id: id_string(&self.id)?,
            init_point: self.init_point.filter(|u| !u.is_empty())?,
            sandbox_init_point: self.sandbox_init_point.filter(|u| !u.is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PaymentResponse {
    pub id: Value,
    pub status: String,
    pub status_detail: Option<String>,
    pub external_reference: Option<String>,
    pub transaction_amount: Option<f64>,
}

impl PaymentResponse {
    pub fn into_payment(self) -> GatewayPayment {
        GatewayPayment {
            id: id_string(&self.id).unwrap_or_default(),
            status: self.status,
            status_detail: self.status_detail,
            external_reference: self.external_reference,
            transaction_amount: amount(self.transaction_amount),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PreapprovalResponse {
    pub id: Value,
    pub status: String,
    pub external_reference: Option<String>,
}

impl PreapprovalResponse {
    pub fn into_preapproval(self) -> GatewayPreapproval {
        GatewayPreapproval {
            id: id_string(&self.id).unwrap_or_default(),
            status: self.status,
            external_reference: self.external_reference,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthorizedPaymentResponse {
    pub id: Value,
    pub preapproval_id: Option<String>,
    pub transaction_amount: Option<f64>,
    pub payment: Option<ChargeStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ChargeStatus {
    pub status: Option<String>,
}

impl AuthorizedPaymentResponse {
    pub fn into_authorized_payment(self) -> GatewayAuthorizedPayment {
        GatewayAuthorizedPayment {
            id: id_string(&self.id).unwrap_or_default(),
            preapproval_id: self.preapproval_id.unwrap_or_default(),
            payment_status: self.payment.and_then(|p| p.status),
            transaction_amount: amount(self.transaction_amount),
        }
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Malformed amounts become `None`, which the settlement floor rejects.
fn amount(value: Option<f64>) -> Option<Money> {
    value.and_then(|v| Money::from_decimal(v).ok())
}
