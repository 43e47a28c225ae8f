//! Database repository for credential-action tokens.
//!
//! Activation and password-reset tokens share one table, distinguished by
//! purpose. At most one unconsumed token may exist per (user, purpose) pair:
//! inserting a new token marks prior unconsumed ones consumed inside the
//! same transaction, via an explicit conditional UPDATE rather than
//! last-write-wins.

use crate::database::models::{AuthToken, TokenPurpose};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

const TOKEN_COLUMNS: &str = "id, user_id, token, purpose, issued_at, expires_at, consumed";

/// Repository for token database operations.
pub struct TokenRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> TokenRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Persists a freshly minted token and retires any prior unconsumed
    /// token of the same (user, purpose) pair.
    pub async fn create_token(
        &self,
        user_id: &str,
        token: &str,
        purpose: TokenPurpose,
        expires_at: DateTime<Utc>,
    ) -> Result<AuthToken> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE auth_tokens SET consumed = 1 WHERE user_id = ? AND purpose = ? AND consumed = 0",
        )
        .bind(user_id)
        .bind(purpose)
        .execute(&mut *tx)
        .await?;

        let created = sqlx::query_as::<_, AuthToken>(&format!(
            r#"
            INSERT INTO auth_tokens (id, user_id, token, purpose, issued_at, expires_at, consumed)
            VALUES (?, ?, ?, ?, ?, ?, 0)
            RETURNING {TOKEN_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7().to_string())
        .bind(user_id)
        .bind(token)
        .bind(purpose)
        .bind(Utc::now())
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(created)
    }

    /// Looks a token up by its value, consumed or not.
    pub async fn get_by_token(&self, token: &str) -> Result<Option<AuthToken>> {
        let token = sqlx::query_as::<_, AuthToken>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM auth_tokens WHERE token = ?"
        ))
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(token)
    }

    /// Marks a token consumed. The conditional write makes consumption
    /// one-shot: a second attempt affects zero rows.
    pub async fn consume(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE auth_tokens SET consumed = 1 WHERE id = ? AND consumed = 0")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Garbage-collects tokens past their expiry.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE expires_at < ?")
            .bind(now)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
