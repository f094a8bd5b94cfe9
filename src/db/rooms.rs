//! Room repository.

use super::DbError;
use sqlx::SqlitePool;

/// Repository for room records.
pub struct RoomRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> RoomRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a freshly created room.
    pub async fn create(
        &self,
        room_id: &str,
        is_private: bool,
        owner_username: &str,
        password: &str,
    ) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO rooms (room_id, is_private, owner_username, password)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(room_id)
        .bind(is_private)
        .bind(owner_username)
        .bind(password)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Delete a room, cascading its messages and bans in one transaction.
    pub async fn delete(&self, room_id: &str) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM messages WHERE room_id = ?")
            .bind(room_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM bans WHERE room_id = ?")
            .bind(room_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM rooms WHERE room_id = ?")
            .bind(room_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Whether a room row exists.
    pub async fn exists(&self, room_id: &str) -> Result<bool, DbError> {
        let found =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM rooms WHERE room_id = ?)")
                .bind(room_id)
                .fetch_one(self.pool)
                .await?;

        Ok(found)
    }

    /// Record an ownership transfer.
    pub async fn update_owner(&self, room_id: &str, new_owner: &str) -> Result<(), DbError> {
        sqlx::query("UPDATE rooms SET owner_username = ? WHERE room_id = ?")
            .bind(new_owner)
            .bind(room_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Record a password change.
    pub async fn update_password(&self, room_id: &str, new_password: &str) -> Result<(), DbError> {
        sqlx::query("UPDATE rooms SET password = ? WHERE room_id = ?")
            .bind(new_password)
            .bind(room_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Stored owner username, if the room is persisted.
    pub async fn owner(&self, room_id: &str) -> Result<Option<String>, DbError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT owner_username FROM rooms WHERE room_id = ?")
                .bind(room_id)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(|(owner,)| owner))
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    #[tokio::test]
    async fn create_exists_delete() {
        let db = Database::new(":memory:").await.unwrap();

        db.rooms().create("123456", false, "alice", "").await.unwrap();
        assert!(db.rooms().exists("123456").await.unwrap());

        db.rooms().delete("123456").await.unwrap();
        assert!(!db.rooms().exists("123456").await.unwrap());
    }

    #[tokio::test]
    async fn delete_cascades_messages_and_bans() {
        let db = Database::new(":memory:").await.unwrap();

        db.rooms().create("123456", true, "alice", "pw").await.unwrap();
        db.messages()
            .save("123456", "alice", "hello", false, None)
            .await
            .unwrap();
        db.bans().add("123456", "bob").await.unwrap();

        db.rooms().delete("123456").await.unwrap();

        assert!(db
            .messages()
            .room_history("123456", 10)
            .await
            .unwrap()
            .is_empty());
        assert!(!db.bans().is_banned("123456", "bob").await.unwrap());
    }

    #[tokio::test]
    async fn owner_updates_are_visible() {
        let db = Database::new(":memory:").await.unwrap();

        db.rooms().create("123456", false, "alice", "").await.unwrap();
        assert_eq!(
            db.rooms().owner("123456").await.unwrap().as_deref(),
            Some("alice")
        );

        db.rooms().update_owner("123456", "bob").await.unwrap();
        assert_eq!(
            db.rooms().owner("123456").await.unwrap().as_deref(),
            Some("bob")
        );
    }

    #[tokio::test]
    async fn password_updates_stick() {
        let db = Database::new(":memory:").await.unwrap();

        db.rooms().create("123456", true, "alice", "old").await.unwrap();
        db.rooms().update_password("123456", "new").await.unwrap();

        let (pw,): (String,) = sqlx::query_as("SELECT password FROM rooms WHERE room_id = ?")
            .bind("123456")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(pw, "new");
    }
}
