//! HTTP adapter - axum routes over the application handlers.
//!
//! - `access` - overview, trial, checkout, cancel-pending, subscriptions
//! - `session` - login admission, heartbeat, logout
//! - `admin` - deletion, password reset, VIP flag, access override, coupons
//! - `webhook` - gateway notifications

pub mod access;
pub mod admin;
pub mod error;
pub mod middleware;
mod router;
pub mod session;
mod state;
pub mod webhook;

pub use error::{ApiError, ErrorResponse};
pub use router::{api_router, app, health, HttpOptions};
pub use state::{AppSettings, AppState};
