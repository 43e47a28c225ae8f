//! Database repository for browser sessions.
//!
//! A session row binds an opaque token to a user identity. Logout clears the
//! binding but keeps the row, and a password change clears every binding for
//! that user in one statement, which is what forces re-login everywhere.

use crate::database::models::Session;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

const SESSION_COLUMNS: &str = "id, token, user_id, created_at, last_access_at, expires_at";

/// Repository for session database operations.
pub struct SessionRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> SessionRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a session bound to a user.
    pub async fn create_session(
        &self,
        token: &str,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session> {
        let now = Utc::now();

        let session = sqlx::query_as::<_, Session>(&format!(
            r#"
            INSERT INTO sessions (id, token, user_id, created_at, last_access_at, expires_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7().to_string())
        .bind(token)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .bind(expires_at)
        .fetch_one(self.pool)
        .await?;

        Ok(session)
    }

    /// Looks up an unexpired session by its opaque token.
    pub async fn get_by_token(&self, token: &str) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE token = ? AND expires_at > ?"
        ))
        .bind(token)
        .bind(Utc::now())
        .fetch_optional(self.pool)
        .await?;

        Ok(session)
    }

    /// Updates the last-access timestamp.
    pub async fn touch(&self, id: &str) -> Result<()> {
        sqlx::query("UPDATE sessions SET last_access_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Clears the user binding for one session. Affecting zero rows is not
    /// an error; logout must never fail.
    pub async fn clear_binding(&self, token: &str) -> Result<()> {
        sqlx::query("UPDATE sessions SET user_id = NULL WHERE token = ?")
            .bind(token)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Clears every session binding for a user.
    pub async fn invalidate_all_for_user(&self, user_id: &str) -> Result<u64> {
        let result = sqlx::query("UPDATE sessions SET user_id = NULL WHERE user_id = ?")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Garbage-collects sessions past their expiry.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
            .bind(now)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
