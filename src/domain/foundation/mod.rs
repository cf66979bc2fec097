//! Foundation module - Shared domain primitives.
//!
//! Identifiers, money, timestamps, the state machine trait and the error
//! vocabulary shared by the access, subscription and settlement modules.

mod auth;
mod errors;
mod ids;
mod money;
mod state_machine;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{GroupNumber, PaymentId, PreapprovalId, ReferralCode, SubjectId, UserId};
pub(crate) use ids::REFERENCE_SEPARATOR;
pub use money::Money;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
