//! chatterd - Multi-room TCP chat server.
//!
//! The library target exists so integration tests can assemble and drive an
//! in-process server; the binary in `main.rs` is a thin bootstrap over the
//! same pieces.

pub mod broadcast;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod network;
pub mod state;
