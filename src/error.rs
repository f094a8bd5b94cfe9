//! Unified error handling for command processing.

use chatter_proto::{ParseError, Reply};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during command handling.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("malformed line: {0}")]
    Protocol(#[from] ParseError),

    #[error("no username set")]
    NoName,

    #[error("not in a room")]
    NotInRoom,

    #[error("not the room owner")]
    NotOwner,

    #[error("usage: {0}")]
    Usage(&'static str),

    /// The session vanished mid-command (disconnect race).
    #[error("session missing")]
    SessionMissing,

    #[error("send error: {0}")]
    Send(#[from] mpsc::error::SendError<String>),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Convert to a client-visible reply.
    ///
    /// Returns `None` for errors that don't warrant one (internal errors,
    /// send failures on a dying connection).
    pub fn to_reply(&self) -> Option<Reply> {
        match self {
            Self::UnknownCommand(verb) => Some(Reply::Error(format!("Unknown command: {verb}"))),
            Self::Protocol(e) => Some(Reply::Error(format!("Malformed line: {e}"))),
            Self::NoName => Some(Reply::Error(
                "Set a username first with /SETNAME <name>".into(),
            )),
            Self::NotInRoom => Some(Reply::Error("You are not in a room".into())),
            Self::NotOwner => Some(Reply::Error("Only the room owner can do that".into())),
            Self::Usage(usage) => Some(Reply::Error(format!("Usage: {usage}"))),
            // These errors don't get client-visible replies
            Self::SessionMissing => None,
            Self::Send(_) => None,
            Self::Internal(_) => None,
        }
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;
