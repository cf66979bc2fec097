//! Authentication adapters.
//!
//! - `JwtSessionValidator` - HS256 bearer tokens from the identity provider
//! - `GoTrueIdentityAdmin` - admin API for user deletion and password resets
//! - `MockSessionValidator` - token map for tests

mod gotrue;
mod jwt;
mod mock;

pub use gotrue::GoTrueIdentityAdmin;
pub use jwt::JwtSessionValidator;
pub use mock::MockSessionValidator;
