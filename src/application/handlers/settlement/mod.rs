//! Settlement handlers - gateway notifications for one-time payments,
//! preapprovals and recurring charges.

mod commission;
mod confirmation_email;
mod handle_notification;
mod outcome;
mod process_authorized_payment;
mod process_payment;
mod process_preapproval;

pub use commission::CommissionCrediting;
pub use confirmation_email::{confirmation_email, subject_label};
pub use handle_notification::{HandleNotificationCommand, HandleNotificationHandler};
pub use outcome::SettlementOutcome;
pub use process_authorized_payment::{
    ProcessAuthorizedPaymentCommand, ProcessAuthorizedPaymentHandler,
};
pub use process_payment::{ProcessPaymentCommand, ProcessPaymentHandler};
pub use process_preapproval::{ProcessPreapprovalCommand, ProcessPreapprovalHandler};
