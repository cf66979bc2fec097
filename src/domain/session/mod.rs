//! Session module - concurrent login admission.

mod guard;
mod token;

pub use guard::{SessionGuard, MAX_SESSIONS, STALE_AFTER_MINUTES};
pub use token::{SessionToken, MAX_DEVICE_INFO};
