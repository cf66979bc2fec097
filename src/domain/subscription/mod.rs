//! Subscription module - recurring preapproval lifecycle.

mod aggregate;
mod status;

pub use aggregate::{StatusChange, Subscription};
pub use status::SubscriptionStatus;
