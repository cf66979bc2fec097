//! Mock payment gateway for testing.
//!
//! Supports:
//! - Pre-configured payments, preapprovals and authorized payments by id
//! - Error injection per method
//! - Recording of created preferences and preapprovals

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::foundation::{Money, PaymentId, PreapprovalId};
use crate::ports::{
    GatewayAuthorizedPayment, GatewayError, GatewayPayment, GatewayPreapproval, HostedCheckout,
    PaymentGateway, PreapprovalRequest, PreferenceRequest,
};

#[derive(Default)]
struct MockState {
    payments: HashMap<String, GatewayPayment>,
    preapprovals: HashMap<String, GatewayPreapproval>,
    authorized_payments: HashMap<String, GatewayAuthorizedPayment>,
    method_errors: HashMap<&'static str, GatewayError>,
    preferences: Vec<PreferenceRequest>,
    preapproval_requests: Vec<PreapprovalRequest>,
    lookups: usize,
    next_id: u64,
}

/// In-process stand-in for the Mercado Pago API.
#[derive(Default)]
pub struct MockPaymentGateway {
    inner: Mutex<MockState>,
    sandbox: bool,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sandbox() -> Self {
        Self {
            sandbox: true,
            ..Self::default()
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration
    // ════════════════════════════════════════════════════════════════════════════

    pub fn add_payment(&self, payment: GatewayPayment) {
        self.state().payments.insert(payment.id.clone(), payment);
    }

    /// Shorthand for a payment with the given status, reference and amount in cents.
    pub fn add_simple_payment(&self, id: &str, status: &str, reference: &str, cents: i64) {
        self.add_payment(GatewayPayment {
            id: id.to_string(),
            status: status.to_string(),
            status_detail: None,
            external_reference: Some(reference.to_string()),
            transaction_amount: Money::from_cents(cents).ok(),
        });
    }

    pub fn add_preapproval(&self, preapproval: GatewayPreapproval) {
        self.state()
            .preapprovals
            .insert(preapproval.id.clone(), preapproval);
    }

    pub fn add_authorized_payment(&self, payment: GatewayAuthorizedPayment) {
        self.state()
            .authorized_payments
            .insert(payment.id.clone(), payment);
    }

    /// Makes every call to `method` fail with `error`.
    pub fn fail_method(&self, method: &'static str, error: GatewayError) {
        self.state().method_errors.insert(method, error);
    }

    pub fn clear_errors(&self) {
        self.state().method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Assertions
    // ════════════════════════════════════════════════════════════════════════════

    pub fn preferences(&self) -> Vec<PreferenceRequest> {
        self.state().preferences.clone()
    }

    pub fn preapproval_requests(&self) -> Vec<PreapprovalRequest> {
        self.state().preapproval_requests.clone()
    }

    /// Number of payment, preapproval and authorized-payment lookups made.
    pub fn lookup_count(&self) -> usize {
        self.state().lookups
    }

    fn check(&self, method: &'static str) -> Result<(), GatewayError> {
        match self.state().method_errors.get(method) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn hosted(&self, prefix: &str) -> HostedCheckout {
        let mut state = self.state();
        state.next_id += 1;
        let id = format!("{}-{}", prefix, state.next_id);
        HostedCheckout {
            init_point: format!("https://mock.gateway/checkout/{}", id),
            sandbox_init_point: Some(format!("https://sandbox.mock.gateway/checkout/{}", id)),
            id,
        }
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn get_payment(&self, payment_id: &PaymentId) -> Result<GatewayPayment, GatewayError> {
        self.check("get_payment")?;
        let mut state = self.state();
        state.lookups += 1;
        state
            .payments
            .get(payment_id.as_str())
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(payment_id.to_string()))
    }

    async fn create_preference(
        &self,
        request: PreferenceRequest,
    ) -> Result<HostedCheckout, GatewayError> {
        self.check("create_preference")?;
        self.state().preferences.push(request);
        Ok(self.hosted("pref"))
    }

    async fn create_preapproval(
        &self,
        request: PreapprovalRequest,
    ) -> Result<HostedCheckout, GatewayError> {
        self.check("create_preapproval")?;
        self.state().preapproval_requests.push(request);
        Ok(self.hosted("preapproval"))
    }

    async fn get_preapproval(
        &self,
        preapproval_id: &PreapprovalId,
    ) -> Result<GatewayPreapproval, GatewayError> {
        self.check("get_preapproval")?;
        let mut state = self.state();
        state.lookups += 1;
        state
            .preapprovals
            .get(preapproval_id.as_str())
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(preapproval_id.to_string()))
    }

    async fn get_authorized_payment(
        &self,
        payment_id: &PaymentId,
    ) -> Result<GatewayAuthorizedPayment, GatewayError> {
        self.check("get_authorized_payment")?;
        let mut state = self.state();
        state.lookups += 1;
        state
            .authorized_payments
            .get(payment_id.as_str())
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(payment_id.to_string()))
    }

    fn is_sandbox(&self) -> bool {
        self.sandbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_configured_payment() {
        let gateway = MockPaymentGateway::new();
        gateway.add_simple_payment("42", "approved", "u|ped|1", 1690);

        let payment = gateway
            .get_payment(&PaymentId::new("42").unwrap())
            .await
            .unwrap();
        assert_eq!(payment.status, "approved");
        assert_eq!(gateway.lookup_count(), 1);
    }

    #[tokio::test]
    async fn unknown_payment_is_not_found() {
        let gateway = MockPaymentGateway::new();
        let err = gateway
            .get_payment(&PaymentId::new("1").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn injected_error_is_returned() {
        let gateway = MockPaymentGateway::new();
        gateway.fail_method("get_payment", GatewayError::Timeout);
        let err = gateway
            .get_payment(&PaymentId::new("1").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::Timeout);
    }
}
