//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `access` - Per-(user, subject) access ledger, trial policy, external reference
//! - `subscription` - Recurring subscription lifecycle
//! - `referral` - Affiliate commission tiers
//! - `settlement` - Gateway notification verification, routing and audit events
//! - `session` - Concurrent session admission
//! - `admin` - Account deletion reporting

pub mod access;
pub mod admin;
pub mod foundation;
pub mod referral;
pub mod session;
pub mod settlement;
pub mod subscription;
