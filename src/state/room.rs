//! Room state: membership, bans, ownership, history ring.

use crate::state::ConnId;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet, VecDeque};
use tokio::sync::mpsc;
use tracing::warn;

/// A live chat room.
///
/// Invariants enforced by the callers that mutate this structure:
/// - the owner is always a member;
/// - an empty room is handed to the cleanup sweeper, never kept;
/// - `id` and `is_private` never change after creation;
/// - a private room always carries a non-empty password.
#[derive(Debug)]
pub struct Room {
    pub id: String,
    pub is_private: bool,
    pub password: String,
    pub owner: ConnId,
    /// Set by the cleanup sweeper just before the room leaves the registry;
    /// joiners holding a stale handle must treat the room as gone.
    pub defunct: bool,
    members: HashSet<ConnId>,
    /// Join-order stamp per member, for the longest-tenure tie-break.
    joined_at: HashMap<ConnId, u64>,
    join_counter: u64,
    banned: HashSet<String>,
    history: VecDeque<String>,
    history_limit: usize,
}

impl Room {
    pub fn new(
        id: String,
        is_private: bool,
        password: String,
        owner: ConnId,
        history_limit: usize,
    ) -> Self {
        let mut room = Self {
            id,
            is_private,
            password,
            owner,
            defunct: false,
            members: HashSet::new(),
            joined_at: HashMap::new(),
            join_counter: 0,
            banned: HashSet::new(),
            history: VecDeque::new(),
            history_limit,
        };
        room.add_member(owner);
        room
    }

    /// Insert a member and stamp its join order. Re-adding an existing
    /// member keeps the original stamp, so tenure survives a re-JOIN.
    pub fn add_member(&mut self, conn_id: ConnId) {
        if self.members.insert(conn_id) {
            self.joined_at.insert(conn_id, self.join_counter);
            self.join_counter += 1;
        }
    }

    pub fn remove_member(&mut self, conn_id: ConnId) {
        self.members.remove(&conn_id);
        self.joined_at.remove(&conn_id);
    }

    pub fn is_member(&self, conn_id: ConnId) -> bool {
        self.members.contains(&conn_id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in join order (oldest first).
    pub fn members_by_tenure(&self) -> Vec<ConnId> {
        let mut members: Vec<ConnId> = self.members.iter().copied().collect();
        members.sort_by_key(|c| self.joined_at.get(c).copied().unwrap_or(u64::MAX));
        members
    }

    /// The longest-tenured member, skipping `except`.
    pub fn longest_member(&self, except: Option<ConnId>) -> Option<ConnId> {
        self.members
            .iter()
            .copied()
            .filter(|c| Some(*c) != except)
            .min_by_key(|c| self.joined_at.get(c).copied().unwrap_or(u64::MAX))
    }

    pub fn verify_password(&self, password: &str) -> bool {
        self.password == password
    }

    pub fn ban(&mut self, username: &str) {
        self.banned.insert(username.to_string());
    }

    pub fn is_banned(&self, username: &str) -> bool {
        self.banned.contains(username)
    }

    /// Append a formatted line to the in-memory ring, dropping the oldest
    /// on overflow.
    pub fn push_history(&mut self, line: String) {
        if self.history.len() >= self.history_limit {
            self.history.pop_front();
        }
        self.history.push_back(line);
    }

    /// The ring contents, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    /// Write a line to every member except `except`.
    ///
    /// A closed per-connection queue is logged and skipped; it never aborts
    /// the iteration.
    pub fn broadcast(
        &self,
        senders: &DashMap<ConnId, mpsc::UnboundedSender<String>>,
        line: &str,
        except: Option<ConnId>,
    ) {
        for conn_id in &self.members {
            if Some(*conn_id) == except {
                continue;
            }
            if let Some(sender) = senders.get(conn_id)
                && sender.send(line.to_string()).is_err()
            {
                warn!(room = %self.id, conn = %conn_id, "Failed to queue line for member");
            }
        }
    }

    /// Write a line to every member.
    pub fn broadcast_to_all(
        &self,
        senders: &DashMap<ConnId, mpsc::UnboundedSender<String>>,
        line: &str,
    ) {
        self.broadcast(senders, line, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> Room {
        Room::new("123456".into(), false, String::new(), ConnId(1), 3)
    }

    #[test]
    fn owner_is_a_member_from_birth() {
        let room = room();
        assert!(room.is_member(ConnId(1)));
        assert_eq!(room.member_count(), 1);
        assert_eq!(room.owner, ConnId(1));
    }

    #[test]
    fn longest_member_skips_the_leaver() {
        let mut room = room();
        room.add_member(ConnId(2));
        room.add_member(ConnId(3));

        assert_eq!(room.longest_member(None), Some(ConnId(1)));
        assert_eq!(room.longest_member(Some(ConnId(1))), Some(ConnId(2)));
    }

    #[test]
    fn rejoin_keeps_original_tenure() {
        let mut room = room();
        room.add_member(ConnId(2));
        room.add_member(ConnId(2));
        room.add_member(ConnId(3));

        // 2 joined before 3 and a duplicate add must not reset that.
        assert_eq!(room.longest_member(Some(ConnId(1))), Some(ConnId(2)));
    }

    #[test]
    fn tenure_survives_interleaved_departures() {
        let mut room = room();
        room.add_member(ConnId(2));
        room.add_member(ConnId(3));
        room.remove_member(ConnId(2));
        room.add_member(ConnId(2));

        assert_eq!(room.longest_member(Some(ConnId(1))), Some(ConnId(3)));
        assert_eq!(
            room.members_by_tenure(),
            vec![ConnId(1), ConnId(3), ConnId(2)]
        );
    }

    #[test]
    fn history_ring_drops_oldest() {
        let mut room = room();
        for i in 0..5 {
            room.push_history(format!("line{i}"));
        }

        let lines: Vec<&str> = room.history().collect();
        assert_eq!(lines, vec!["line2", "line3", "line4"]);
    }

    #[test]
    fn ban_set_matches_exact_names() {
        let mut room = room();
        room.ban("Bob");

        assert!(room.is_banned("Bob"));
        assert!(!room.is_banned("bob"));
    }
}
