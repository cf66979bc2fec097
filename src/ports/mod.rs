//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `AccessRepository` - Access entries and lifetime trial grants
//! - `SubscriptionRepository` - Subscriptions and processed recurring payments
//! - `CommissionLedger` - Affiliate commissions
//! - `ProfileRepository` - Profile flags and referral codes
//! - `SessionStore` - Admitted login sessions
//! - `EventLog` - Append-only audit events
//! - `UserDataPurger` - Per-table user data deletion
//!
//! ## External Service Ports
//!
//! - `PaymentGateway` - Hosted checkouts and payment lookups
//! - `EmailSender` - Transactional email
//! - `SessionValidator` - Bearer token validation
//! - `IdentityAdmin` - Identity provider admin operations

mod access_repository;
mod commission_ledger;
mod email_sender;
mod event_log;
mod identity_admin;
mod payment_gateway;
mod profile_repository;
mod save_result;
mod session_store;
mod session_validator;
mod subscription_repository;
mod user_data_purger;

pub use access_repository::AccessRepository;
pub use commission_ledger::CommissionLedger;
pub use email_sender::{EmailMessage, EmailSender};
pub use event_log::EventLog;
pub use identity_admin::IdentityAdmin;
pub use payment_gateway::{
    BackUrls, GatewayAuthorizedPayment, GatewayError, GatewayPayment, GatewayPreapproval,
    HostedCheckout, PaymentGateway, PaymentMethod, PreapprovalRequest, PreferenceRequest,
};
pub use profile_repository::{Profile, ProfileRepository};
pub use save_result::SaveResult;
pub use session_store::SessionStore;
pub use session_validator::SessionValidator;
pub use subscription_repository::SubscriptionRepository;
pub use user_data_purger::UserDataPurger;
