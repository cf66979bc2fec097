//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Commands change the access ledger, subscriptions or sessions; queries
//! read them back for the caller.

pub mod handlers;

pub use handlers::{CheckoutLinks, EventRecorder, HandlerError};
