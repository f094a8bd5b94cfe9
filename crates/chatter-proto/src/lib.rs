//! # chatter-proto
//!
//! Wire protocol for the chatterd room server.
//!
//! The protocol is newline-delimited UTF-8 text. A client line is classified
//! by its first non-whitespace character:
//!
//! - `/` — a command; the word after the slash is the verb (matched
//!   case-insensitively), the remainder is the argument string.
//! - `@` — a private message; `@recipient content`.
//! - anything else — a public message to the sender's current room.
//!
//! Server lines are keyword-tagged (`ROOM_CREATED:123456:PUBLIC`,
//! `ERROR:reason`, ...). Chat traffic is rendered as
//! `[HH:MM:SS] sender: content`.
//!
//! ## Quick start
//!
//! ```rust
//! use chatter_proto::{Inbound, Reply};
//!
//! let parsed = chatter_proto::parse("/join 123456 hunter2").unwrap();
//! assert_eq!(
//!     parsed,
//!     Some(Inbound::Command { verb: "JOIN".into(), args: "123456 hunter2".into() })
//! );
//!
//! let line = Reply::RoomJoined("123456".into()).to_string();
//! assert_eq!(line, "ROOM_JOINED:123456");
//! ```

pub mod format;
pub mod inbound;
pub mod reply;

pub use self::format::{chat_line, history_line, system_line, timestamp};
pub use self::inbound::{parse, Inbound, ParseError};
pub use self::reply::{Reply, RoomSummary};

/// Maximum accepted line length in bytes (the connection read buffer size).
pub const MAX_LINE_LEN: usize = 4096;

/// Default TCP port the server listens on.
pub const DEFAULT_PORT: u16 = 12345;
