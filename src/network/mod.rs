//! Network layer: TCP gateway and per-connection handling.

mod connection;
mod gateway;

pub use connection::Connection;
pub use gateway::Gateway;
