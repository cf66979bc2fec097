//! Rotation Access - access lifecycle and payment settlement for the
//! internship rotation planner.
//!
//! Students unlock a subject through a one-time trial, a PIX or card
//! purchase, or a monthly subscription. Payment gateway notifications are
//! verified, checked against a price floor and applied idempotently to the
//! access ledger, crediting affiliate commissions along the way.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
