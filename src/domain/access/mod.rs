//! Access module - per-(user, subject) access lifecycle.
//!
//! - `AccessStatus` state machine and the `AccessEntry` aggregate
//! - `AccessLedger` service with version-checked atomic transitions
//! - trial and subscription policy functions
//! - the external reference wire format shared with the payment gateway
//! - checkout prices

mod entry;
mod errors;
mod ledger;
mod policy;
mod pricing;
mod reference;
mod status;

pub use entry::{AccessEntry, CancelDisposition, ConfirmOutcome};
pub use errors::AccessError;
pub use ledger::{AccessLedger, MAX_ATTEMPTS};
pub use policy::{
    default_module_end_date, is_access_window_open, is_trial_eligible, next_period_end,
    trial_expiry, AccessPolicy, TrialGrant, SUBSCRIPTION_PERIOD_DAYS, TRIAL_DURATION_HOURS,
};
pub use pricing::Pricing;
pub use reference::{PurchaseReference, ReferenceError, SubscriptionReference};
pub use status::AccessStatus;
