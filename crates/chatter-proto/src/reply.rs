//! Typed server replies.
//!
//! Every outbound line the server emits is one of these variants. `Display`
//! renders the line without a trailing newline; the transport codec frames it.

use std::fmt;

/// One room as shown by `LIST`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub id: String,
    pub member_count: usize,
    pub is_private: bool,
}

impl fmt::Display for RoomSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_private { "PRIVATE" } else { "PUBLIC" };
        write!(f, "{}({})[{}]", self.id, self.member_count, kind)
    }
}

/// A keyword-tagged server line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Welcome(String),
    NameSet,
    NameTaken,
    RoomCreated { id: String, is_private: bool },
    RoomJoined(String),
    RoomNotFound,
    PasswordRequired,
    WrongPassword,
    RoomsList(Vec<RoomSummary>),
    UsersList(Vec<String>),
    RoomPassword(String),
    PasswordChanged(String),
    MessageHistoryStart,
    MessageHistoryEnd,
    KickedFromRoom,
    LeftRoom,
    OwnerLeaveWarning,
    OwnershipReceived,
    Success(String),
    Error(String),
    PmFrom { sender: String, content: String },
    PmSent { recipient: String, content: String },
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Welcome(text) => write!(f, "WELCOME:{text}"),
            Self::NameSet => write!(f, "NAME_SET"),
            Self::NameTaken => write!(f, "NAME_TAKEN"),
            Self::RoomCreated { id, is_private } => {
                let kind = if *is_private { "PRIVATE" } else { "PUBLIC" };
                write!(f, "ROOM_CREATED:{id}:{kind}")
            }
            Self::RoomJoined(id) => write!(f, "ROOM_JOINED:{id}"),
            Self::RoomNotFound => write!(f, "ROOM_NOT_FOUND"),
            Self::PasswordRequired => write!(f, "PASSWORD_REQUIRED"),
            Self::WrongPassword => write!(f, "WRONG_PASSWORD"),
            Self::RoomsList(rooms) => {
                write!(f, "ROOMS_LIST:")?;
                for (i, room) in rooms.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{room}")?;
                }
                Ok(())
            }
            Self::UsersList(users) => {
                write!(f, "USERS_LIST:{}", users.join(","))
            }
            Self::RoomPassword(pw) => write!(f, "ROOM_PASSWORD:{pw}"),
            Self::PasswordChanged(pw) => write!(f, "PASSWORD_CHANGED:{pw}"),
            Self::MessageHistoryStart => write!(f, "MESSAGE_HISTORY_START"),
            Self::MessageHistoryEnd => write!(f, "MESSAGE_HISTORY_END"),
            Self::KickedFromRoom => write!(f, "KICKED_FROM_ROOM"),
            Self::LeftRoom => write!(f, "LEFT_ROOM"),
            Self::OwnerLeaveWarning => write!(f, "OWNER_LEAVE_WARNING"),
            Self::OwnershipReceived => write!(f, "OWNERSHIP_RECEIVED"),
            Self::Success(text) => write!(f, "SUCCESS:{text}"),
            Self::Error(text) => write!(f, "ERROR:{text}"),
            Self::PmFrom { sender, content } => write!(f, "PM_FROM:{sender}:{content}"),
            Self::PmSent { recipient, content } => write!(f, "PM_SENT:{recipient}:{content}"),
        }
    }
}
