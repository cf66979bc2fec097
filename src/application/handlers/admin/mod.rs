//! Admin handlers. Every operation re-reads the caller's admin flag from the
//! profile table.

mod delete_user;
mod override_access;
mod require_admin;
mod reset_password;
mod set_vip;

pub use delete_user::{DeleteUserCommand, DeleteUserHandler};
pub use override_access::{OverrideAccessCommand, OverrideAccessHandler};
pub use require_admin::require_admin;
pub use reset_password::{ResetPasswordCommand, ResetPasswordHandler};
pub use set_vip::{SetVipCommand, SetVipHandler};
