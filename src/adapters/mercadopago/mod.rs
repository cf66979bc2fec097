//! Mercado Pago payment gateway adapter.
//!
//! - `MercadoPagoGateway` talks to the REST API (preferences, preapprovals,
//!   payment and recurring charge lookups)
//! - `MockPaymentGateway` is an in-process stand-in for tests
//!
//! Notification signatures are verified in the domain
//! (`domain::settlement::SignatureVerifier`), not here.

mod client;
mod mock;
mod wire_types;

pub use client::{MercadoPagoConfig, MercadoPagoGateway};
pub use mock::MockPaymentGateway;
