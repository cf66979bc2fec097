//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - Storage ports on PostgreSQL (sqlx)
//! - `mercadopago` - Payment gateway REST client
//! - `email` - Resend transactional email
//! - `auth` - JWT validation and identity provider admin API
//! - `memory` - In-memory ports for tests and local runs
//! - `http` - axum routes

pub mod auth;
pub mod email;
pub mod http;
pub mod memory;
pub mod mercadopago;
pub mod postgres;
