//! Rust structs that represent database table mappings.
//!
//! These models define the structure of data as it is stored in and retrieved
//! from the database. Note that these may differ from API-specific models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Account lifecycle state. `Pending` accounts exist but cannot log in until
/// the activation token from the registration email has been used; there is
/// no transition back from `Active`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT")] // Store as TEXT in SQLite
pub enum AccountStatus {
    Pending,
    Active,
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountStatus::Pending => write!(f, "Pending"),
            AccountStatus::Active => write!(f, "Active"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    /// Never serialized; password hashes do not leave the store boundary.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: String,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Validate)]
pub struct CreateUser {
    #[validate(
        email(message = "Must be a valid email"),
        length(max = 255, message = "Email too long")
    )]
    pub email: String,

    #[validate(length(min = 1, message = "Password hash is required"))]
    pub password_hash: String,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Display name must be between 1-255 characters"
    ))]
    pub display_name: String,
}

/// What a credential-action token authorizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT")]
pub enum TokenPurpose {
    Activate,
    ResetPassword,
}

impl std::fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenPurpose::Activate => write!(f, "Activate"),
            TokenPurpose::ResetPassword => write!(f, "ResetPassword"),
        }
    }
}

/// One-shot, time-bounded credential-action authorization.
///
/// A token is valid iff it is unconsumed, unexpired, and its purpose matches
/// the action being performed. Issuing a new token for the same
/// (user, purpose) pair invalidates any prior unconsumed one.
#[derive(Debug, Clone, FromRow)]
pub struct AuthToken {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub purpose: TokenPurpose,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
}

/// Server-side record behind the opaque browser session token.
/// `user_id` is NULL for anonymous sessions and after logout.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: String,
    pub token: String,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_access_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Topic {
    pub id: String,
    pub category_id: String,
    pub author_id: String,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTopicRequest {
    #[validate(length(min = 1, message = "Category ID is required"))]
    pub category_id: String,

    #[validate(length(
        min = 3,
        max = 255,
        message = "Title must be between 3-255 characters"
    ))]
    pub title: String,

    #[validate(length(
        min = 10,
        max = 20000,
        message = "Body must be between 10-20000 characters"
    ))]
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: String,
    pub topic_id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(
        min = 1,
        max = 10000,
        message = "Comment must be between 1-10000 characters"
    ))]
    pub body: String,
}
