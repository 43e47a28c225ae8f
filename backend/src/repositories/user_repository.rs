//! Database repository for user account records.
//!
//! Thin persistence boundary for the User entity. Email uniqueness is
//! enforced by the `users.email` UNIQUE constraint, so concurrent
//! registrations for the same address are serialized by the database;
//! callers map the resulting constraint violation to a conflict error.

use crate::database::models::{AccountStatus, CreateUser, User};
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, email, password_hash, display_name, status, created_at, updated_at, is_deleted, deleted_at";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Creates a new UserRepository instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a new user with status `Pending`.
    ///
    /// The email must already be normalized (lowercased); a duplicate email
    /// surfaces as a UNIQUE constraint violation from the database.
    pub async fn create_user(&self, user: CreateUser) -> Result<User> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, password_hash, display_name, status, created_at, updated_at, is_deleted)
            VALUES (?, ?, ?, ?, ?, ?, ?, 0)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.display_name)
        .bind(AccountStatus::Pending)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(user)
    }

    /// Retrieves a user by their unique identifier.
    ///
    /// # Returns
    /// `Some(User)` if found and not soft-deleted, `None` otherwise
    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ? AND is_deleted = 0"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Retrieves a user by their (normalized) email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? AND is_deleted = 0"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Checks if an email already exists in the system.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ? AND is_deleted = 0")
                .bind(email)
                .fetch_one(self.pool)
                .await?;

        Ok(count > 0)
    }

    /// Moves a user to the given lifecycle status.
    pub async fn update_status(&self, id: &str, status: AccountStatus) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET status = ?, updated_at = ? WHERE id = ? AND is_deleted = 0",
        )
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Replaces the stored password hash.
    pub async fn update_password_hash(&self, id: &str, password_hash: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ? AND is_deleted = 0",
        )
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Soft-disables a user. Accounts are never hard-deleted.
    pub async fn disable_user(&self, id: &str) -> Result<bool> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE users SET is_deleted = 1, deleted_at = ?, updated_at = ? WHERE id = ? AND is_deleted = 0",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
