//! Database repository for forum categories, topics and comments.
//!
//! Topics and comments are soft-deleted only, matching the user table.

use crate::database::models::{Category, Comment, Topic};
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

const TOPIC_COLUMNS: &str =
    "id, category_id, author_id, title, body, created_at, updated_at, is_deleted, deleted_at";
const COMMENT_COLUMNS: &str =
    "id, topic_id, author_id, body, created_at, is_deleted, deleted_at";

/// Repository for forum database operations.
pub struct ForumRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> ForumRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, created_at FROM categories ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn get_category_by_id(&self, id: &str) -> Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, created_at FROM categories WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(category)
    }

    pub async fn create_topic(
        &self,
        category_id: &str,
        author_id: &str,
        title: &str,
        body: &str,
    ) -> Result<Topic> {
        let now = Utc::now();

        let topic = sqlx::query_as::<_, Topic>(&format!(
            r#"
            INSERT INTO topics (id, category_id, author_id, title, body, created_at, updated_at, is_deleted)
            VALUES (?, ?, ?, ?, ?, ?, ?, 0)
            RETURNING {TOPIC_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7().to_string())
        .bind(category_id)
        .bind(author_id)
        .bind(title)
        .bind(body)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(topic)
    }

    pub async fn get_topic_by_id(&self, id: &str) -> Result<Option<Topic>> {
        let topic = sqlx::query_as::<_, Topic>(&format!(
            "SELECT {TOPIC_COLUMNS} FROM topics WHERE id = ? AND is_deleted = 0"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(topic)
    }

    /// Newest-first page of topics in a category.
    pub async fn list_topics_by_category(
        &self,
        category_id: &str,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Topic>> {
        let topics = sqlx::query_as::<_, Topic>(&format!(
            r#"
            SELECT {TOPIC_COLUMNS} FROM topics
            WHERE category_id = ? AND is_deleted = 0
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#
        ))
        .bind(category_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(self.pool)
        .await?;

        Ok(topics)
    }

    pub async fn count_topics_by_category(&self, category_id: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM topics WHERE category_id = ? AND is_deleted = 0",
        )
        .bind(category_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count as u64)
    }

    pub async fn soft_delete_topic(&self, id: &str) -> Result<bool> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE topics SET is_deleted = 1, deleted_at = ?, updated_at = ? WHERE id = ? AND is_deleted = 0",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn create_comment(
        &self,
        topic_id: &str,
        author_id: &str,
        body: &str,
    ) -> Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            INSERT INTO comments (id, topic_id, author_id, body, created_at, is_deleted)
            VALUES (?, ?, ?, ?, ?, 0)
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7().to_string())
        .bind(topic_id)
        .bind(author_id)
        .bind(body)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(comment)
    }

    /// Oldest-first comments for a topic thread.
    pub async fn list_comments_by_topic(&self, topic_id: &str) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS} FROM comments
            WHERE topic_id = ? AND is_deleted = 0
            ORDER BY created_at ASC
            "#
        ))
        .bind(topic_id)
        .fetch_all(self.pool)
        .await?;

        Ok(comments)
    }
}
