//! Connection-scoped session state.

use std::fmt;

/// Opaque identifier for one live connection.
///
/// Issued at accept and unique for the life of the process; raw sockets are
/// never used as map keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnId(pub u64);

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// One live client connection and its identity.
#[derive(Debug)]
pub struct Session {
    pub conn_id: ConnId,
    /// Empty until SETNAME; unique across live sessions when non-empty.
    pub username: String,
    /// Empty when not in a room.
    pub room_id: String,
    pub is_owner: bool,
    /// Set after OWNER_LEAVE_WARNING; cleared by any room change.
    pub owner_leave_armed: bool,
    pub connected_at: chrono::DateTime<chrono::Utc>,
}

impl Session {
    pub fn new(conn_id: ConnId) -> Self {
        Self {
            conn_id,
            username: String::new(),
            room_id: String::new(),
            is_owner: false,
            owner_leave_armed: false,
            connected_at: chrono::Utc::now(),
        }
    }

    /// Whether this session currently sits in a room.
    pub fn in_room(&self) -> bool {
        !self.room_id.is_empty()
    }

    /// Reset all room-scoped state.
    pub fn clear_room(&mut self) {
        self.room_id.clear();
        self.is_owner = false;
        self.owner_leave_armed = false;
    }
}
