//! Referral module - affiliate commission tiers.

mod commission;

pub use commission::{commission_percent, distinct_total, ReferralCommission};
