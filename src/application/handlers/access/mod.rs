//! Access handlers - trials, checkouts and the caller's access overview.

mod activate_trial;
mod cancel_pending;
mod create_checkout;
mod create_coupon_checkout;
mod get_access_overview;

// Commands
pub use activate_trial::{ActivateTrialCommand, ActivateTrialHandler, ActivateTrialResult};
pub use cancel_pending::{CancelPendingCommand, CancelPendingHandler, CancelPendingResult};
pub use create_checkout::{CreateCheckoutCommand, CreateCheckoutHandler, CreateCheckoutResult};
pub use create_coupon_checkout::{
    CreateCouponCheckoutCommand, CreateCouponCheckoutHandler, CreateCouponCheckoutResult,
};

// Queries
pub use get_access_overview::{
    AccessOverview, GetAccessOverviewHandler, GetAccessOverviewQuery, SubjectAccess,
};
