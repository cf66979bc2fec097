//! Session handlers - login admission, heartbeat and logout.

mod end_session;
mod heartbeat;
mod register_session;

pub use end_session::{EndSessionCommand, EndSessionHandler};
pub use heartbeat::{HeartbeatCommand, HeartbeatHandler, HeartbeatResult};
pub use register_session::{RegisterSessionCommand, RegisterSessionHandler, RegisterSessionResult};
