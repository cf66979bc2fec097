//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations, grouped by
//! the caller they serve: the signed-in student (`access`, `subscription`,
//! `session`), support staff (`admin`) and the payment gateway
//! (`settlement`).

pub mod access;
pub mod admin;
mod checkout_links;
mod error;
mod event_recorder;
pub mod session;
pub mod settlement;
pub mod subscription;

pub use checkout_links::CheckoutLinks;
pub use error::HandlerError;
pub use event_recorder::EventRecorder;
