//! Message repository.
//!
//! Saves are best-effort from the caller's point of view: the broadcaster
//! logs failures and keeps going with in-memory state.

use super::DbError;
use sqlx::SqlitePool;

/// Row type for history queries: (timestamp, sender, content).
type HistoryRow = (String, String, String);

/// Repository for message persistence and history queries.
pub struct MessageRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MessageRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record one message. `recipient` is set only for private messages.
    pub async fn save(
        &self,
        room_id: &str,
        sender: &str,
        content: &str,
        is_private: bool,
        recipient: Option<&str>,
    ) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO messages (room_id, sender_username, content, is_private, recipient_username)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(room_id)
        .bind(sender)
        .bind(content)
        .bind(is_private)
        .bind(recipient)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// The most recent `limit` public messages of a room, oldest first,
    /// each formatted `[HH:MM:SS] sender: content` like live traffic.
    pub async fn room_history(&self, room_id: &str, limit: u32) -> Result<Vec<String>, DbError> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            r#"
            SELECT timestamp, sender_username, content
            FROM messages
            WHERE room_id = ? AND is_private = 0
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(room_id)
        .bind(limit as i64)
        .fetch_all(self.pool)
        .await?;

        let mut lines: Vec<String> = rows
            .into_iter()
            .map(|(ts, sender, content)| chatter_proto::history_line(&ts, &sender, &content))
            .collect();

        // Reverse to chronological order (oldest first)
        lines.reverse();
        Ok(lines)
    }

    /// Symmetric private conversation view between two users, oldest first.
    pub async fn private_between(
        &self,
        user_a: &str,
        user_b: &str,
        limit: u32,
    ) -> Result<Vec<String>, DbError> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            r#"
            SELECT timestamp, sender_username, content
            FROM messages
            WHERE is_private = 1
              AND ((sender_username = ? AND recipient_username = ?)
                OR (sender_username = ? AND recipient_username = ?))
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .bind(user_b)
        .bind(user_a)
        .bind(limit as i64)
        .fetch_all(self.pool)
        .await?;

        let mut lines: Vec<String> = rows
            .into_iter()
            .map(|(ts, sender, content)| chatter_proto::history_line(&ts, &sender, &content))
            .collect();

        lines.reverse();
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    #[tokio::test]
    async fn history_is_chronological_and_public_only() {
        let db = Database::new(":memory:").await.unwrap();

        db.messages()
            .save("123456", "alice", "first", false, None)
            .await
            .unwrap();
        db.messages()
            .save("123456", "bob", "second", false, None)
            .await
            .unwrap();
        db.messages()
            .save("123456", "alice", "psst", true, Some("bob"))
            .await
            .unwrap();
        db.messages()
            .save("999999", "carol", "elsewhere", false, None)
            .await
            .unwrap();

        let lines = db.messages().room_history("123456", 50).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("alice: first"));
        assert!(lines[1].ends_with("bob: second"));

        // Replayed lines carry the same `[HH:MM:SS]` bracket as live ones.
        for line in &lines {
            assert_eq!(line.find(']'), Some(9), "bad bracket in {line:?}");
            assert_eq!(&line[3..4], ":");
            assert_eq!(&line[6..7], ":");
        }
    }

    #[tokio::test]
    async fn history_limit_keeps_most_recent() {
        let db = Database::new(":memory:").await.unwrap();

        for i in 0..5 {
            db.messages()
                .save("123456", "alice", &format!("msg{i}"), false, None)
                .await
                .unwrap();
        }

        let lines = db.messages().room_history("123456", 3).await.unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("msg2"));
        assert!(lines[2].ends_with("msg4"));
    }

    #[tokio::test]
    async fn private_view_is_symmetric() {
        let db = Database::new(":memory:").await.unwrap();

        db.messages()
            .save("123456", "alice", "hi bob", true, Some("bob"))
            .await
            .unwrap();
        db.messages()
            .save("123456", "bob", "hi alice", true, Some("alice"))
            .await
            .unwrap();
        db.messages()
            .save("123456", "alice", "hi carol", true, Some("carol"))
            .await
            .unwrap();

        let ab = db
            .messages()
            .private_between("alice", "bob", 50)
            .await
            .unwrap();
        let ba = db
            .messages()
            .private_between("bob", "alice", 50)
            .await
            .unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.len(), 2);
        assert!(ab[0].ends_with("alice: hi bob"));
    }
}
