//! Ban repository.
//!
//! Bans are keyed by `(room_id, username)` and outlive both the in-memory
//! room and the process; the join path checks here as well as the room's
//! own ban set.

use super::DbError;
use sqlx::SqlitePool;

/// Repository for per-room ban records.
pub struct BanRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> BanRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a ban. Idempotent.
    pub async fn add(&self, room_id: &str, username: &str) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO bans (room_id, username)
            VALUES (?, ?)
            ON CONFLICT(room_id, username) DO NOTHING
            "#,
        )
        .bind(room_id)
        .bind(username)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Lift a ban.
    pub async fn remove(&self, room_id: &str, username: &str) -> Result<(), DbError> {
        sqlx::query("DELETE FROM bans WHERE room_id = ? AND username = ?")
            .bind(room_id)
            .bind(username)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Whether a username is banned from a room.
    pub async fn is_banned(&self, room_id: &str, username: &str) -> Result<bool, DbError> {
        let found = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM bans WHERE room_id = ? AND username = ?)",
        )
        .bind(room_id)
        .bind(username)
        .fetch_one(self.pool)
        .await?;

        Ok(found)
    }

    /// All banned usernames for a room.
    pub async fn banned_users(&self, room_id: &str) -> Result<Vec<String>, DbError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT username FROM bans WHERE room_id = ? ORDER BY banned_at")
                .bind(room_id)
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    #[tokio::test]
    async fn add_is_idempotent() {
        let db = Database::new(":memory:").await.unwrap();

        db.bans().add("123456", "bob").await.unwrap();
        db.bans().add("123456", "bob").await.unwrap();

        assert!(db.bans().is_banned("123456", "bob").await.unwrap());
        assert_eq!(db.bans().banned_users("123456").await.unwrap(), vec!["bob"]);
    }

    #[tokio::test]
    async fn remove_lifts_the_ban() {
        let db = Database::new(":memory:").await.unwrap();

        db.bans().add("123456", "bob").await.unwrap();
        db.bans().remove("123456", "bob").await.unwrap();

        assert!(!db.bans().is_banned("123456", "bob").await.unwrap());
    }

    #[tokio::test]
    async fn bans_are_scoped_to_rooms() {
        let db = Database::new(":memory:").await.unwrap();

        db.bans().add("123456", "bob").await.unwrap();
        assert!(!db.bans().is_banned("999999", "bob").await.unwrap());
    }
}
