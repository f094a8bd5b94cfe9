//! User repository.
//!
//! The durable user list. Rows are auto-registered the first time a live
//! session takes a username; `last_seen` is refreshed on SETNAME and on
//! disconnect.

use super::DbError;
use sqlx::SqlitePool;

/// Repository for user operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a user. Returns false when the username already exists.
    pub async fn create(&self, username: &str, password_hash: &str) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES (?, ?)
            ON CONFLICT(username) DO NOTHING
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Check credentials against the stored hash.
    pub async fn authenticate(&self, username: &str, password_hash: &str) -> Result<bool, DbError> {
        let found = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? AND password_hash = ?)",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await?;

        Ok(found)
    }

    /// Whether a user row exists.
    pub async fn exists(&self, username: &str) -> Result<bool, DbError> {
        let found =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)")
                .bind(username)
                .fetch_one(self.pool)
                .await?;

        Ok(found)
    }

    /// Refresh `last_seen` for a user.
    pub async fn update_last_seen(&self, username: &str) -> Result<(), DbError> {
        sqlx::query("UPDATE users SET last_seen = CURRENT_TIMESTAMP WHERE username = ?")
            .bind(username)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Create-if-missing plus a `last_seen` refresh, used by SETNAME.
    pub async fn register_seen(&self, username: &str) -> Result<(), DbError> {
        self.create(username, "").await?;
        self.update_last_seen(username).await
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    #[tokio::test]
    async fn create_is_unique() {
        let db = Database::new(":memory:").await.unwrap();

        assert!(db.users().create("alice", "h1").await.unwrap());
        assert!(!db.users().create("alice", "h2").await.unwrap());
        assert!(db.users().exists("alice").await.unwrap());
        assert!(!db.users().exists("bob").await.unwrap());
    }

    #[tokio::test]
    async fn authenticate_matches_stored_hash() {
        let db = Database::new(":memory:").await.unwrap();

        db.users().create("alice", "h1").await.unwrap();
        assert!(db.users().authenticate("alice", "h1").await.unwrap());
        assert!(!db.users().authenticate("alice", "wrong").await.unwrap());
        assert!(!db.users().authenticate("ghost", "h1").await.unwrap());
    }

    #[tokio::test]
    async fn register_seen_is_idempotent() {
        let db = Database::new(":memory:").await.unwrap();

        db.users().register_seen("alice").await.unwrap();
        db.users().register_seen("alice").await.unwrap();
        assert!(db.users().exists("alice").await.unwrap());
    }
}
