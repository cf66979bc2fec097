//! Settlement module - everything about inbound gateway notifications that
//! does not need I/O.
//!
//! - `SignatureVerifier` for the HMAC header
//! - `Notification` routing from query/body
//! - `PaymentDisposition` and `AmountFloor` for one-time payments
//! - `AccessEvent` audit events with renderers
//! - `WebhookError` and its HTTP status mapping

mod events;
mod notification;
mod payment;
mod signature;
mod webhook_errors;

pub use events::{AccessEvent, EventRecord, RenderedEvent};
pub use notification::{Notification, NotificationTopic};
pub use payment::{AmountFloor, PaymentDisposition};
pub use signature::{sign_notification, signature_manifest, SignatureHeader, SignatureVerifier};
pub use webhook_errors::WebhookError;
