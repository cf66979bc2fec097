//! In-memory port implementations.
//!
//! Used by unit and integration tests, and by local runs without a
//! database. They enforce the same uniqueness and version rules as the
//! Postgres adapters so concurrency tests mean something.

mod access_repository;
mod commission_ledger;
mod email_sender;
mod event_log;
mod identity_admin;
mod profile_repository;
mod session_store;
mod subscription_repository;
mod user_data_purger;

pub use access_repository::InMemoryAccessRepository;
pub use commission_ledger::InMemoryCommissionLedger;
pub use email_sender::RecordingEmailSender;
pub use event_log::InMemoryEventLog;
pub use identity_admin::InMemoryIdentityAdmin;
pub use profile_repository::InMemoryProfileRepository;
pub use session_store::InMemorySessionStore;
pub use subscription_repository::InMemorySubscriptionRepository;
pub use user_data_purger::InMemoryUserDataPurger;
