//! Shared server state.

mod hub;
mod room;
mod session;

pub use hub::{Hub, run_cleanup_sweeper};
pub use room::Room;
pub use session::{ConnId, Session};
