//! Forum business logic service.
//!
//! Handles topic and comment operations on top of the forum repository.
//! Writes require an authenticated user; deletes are restricted to the
//! topic author.

use crate::api::common::PaginationFilter;
use crate::database::models::{Category, Comment, CreateCommentRequest, CreateTopicRequest, Topic};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::forum_repository::ForumRepository;
use sqlx::SqlitePool;
use validator::Validate;

pub struct ForumService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> ForumService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_categories(&self) -> ServiceResult<Vec<Category>> {
        let repo = ForumRepository::new(self.pool);
        let categories = repo.list_categories().await?;
        Ok(categories)
    }

    /// Creates a topic in an existing category.
    pub async fn create_topic(
        &self,
        author_id: &str,
        request: CreateTopicRequest,
    ) -> ServiceResult<Topic> {
        if let Err(validation_errors) = request.validate() {
            return Err(ServiceError::from_validation(validation_errors));
        }

        let repo = ForumRepository::new(self.pool);

        if repo
            .get_category_by_id(&request.category_id)
            .await?
            .is_none()
        {
            return Err(ServiceError::not_found("Category", &request.category_id));
        }

        let topic = repo
            .create_topic(&request.category_id, author_id, &request.title, &request.body)
            .await?;

        Ok(topic)
    }

    /// Newest-first page of topics in a category.
    pub async fn list_topics(
        &self,
        category_id: &str,
        pagination: &PaginationFilter,
    ) -> ServiceResult<(Vec<Topic>, u64)> {
        if let Err(validation_errors) = pagination.validate() {
            return Err(ServiceError::from_validation(validation_errors));
        }

        let repo = ForumRepository::new(self.pool);

        if repo.get_category_by_id(category_id).await?.is_none() {
            return Err(ServiceError::not_found("Category", category_id));
        }

        let topics = repo
            .list_topics_by_category(category_id, pagination.limit(), pagination.offset())
            .await?;
        let total = repo.count_topics_by_category(category_id).await?;

        Ok((topics, total))
    }

    /// Retrieves a topic with its comment thread.
    pub async fn get_topic(&self, id: &str) -> ServiceResult<(Topic, Vec<Comment>)> {
        let repo = ForumRepository::new(self.pool);

        let topic = repo
            .get_topic_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Topic", id))?;

        let comments = repo.list_comments_by_topic(id).await?;

        Ok((topic, comments))
    }

    pub async fn add_comment(
        &self,
        author_id: &str,
        topic_id: &str,
        request: CreateCommentRequest,
    ) -> ServiceResult<Comment> {
        if let Err(validation_errors) = request.validate() {
            return Err(ServiceError::from_validation(validation_errors));
        }

        let repo = ForumRepository::new(self.pool);

        if repo.get_topic_by_id(topic_id).await?.is_none() {
            return Err(ServiceError::not_found("Topic", topic_id));
        }

        let comment = repo.create_comment(topic_id, author_id, &request.body).await?;
        Ok(comment)
    }

    /// Soft-deletes a topic. Only the author may delete their topic.
    pub async fn delete_topic(&self, author_id: &str, topic_id: &str) -> ServiceResult<()> {
        let repo = ForumRepository::new(self.pool);

        let topic = repo
            .get_topic_by_id(topic_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Topic", topic_id))?;

        if topic.author_id != author_id {
            return Err(ServiceError::permission_denied(
                "Only the topic author can delete it",
            ));
        }

        if !repo.soft_delete_topic(topic_id).await? {
            return Err(ServiceError::not_found("Topic", topic_id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::CreateUser;
    use crate::database::test_pool;
    use crate::repositories::user_repository::UserRepository;
    use chrono::Utc;
    use uuid::Uuid;

    async fn seed_user(pool: &SqlitePool, email: &str) -> String {
        let repo = UserRepository::new(pool);
        let user = repo
            .create_user(CreateUser {
                email: email.to_string(),
                password_hash: "x".to_string(),
                display_name: "Test".to_string(),
            })
            .await
            .unwrap();
        user.id
    }

    async fn seed_category(pool: &SqlitePool, name: &str) -> String {
        let id = Uuid::now_v7().to_string();
        sqlx::query("INSERT INTO categories (id, name, description, created_at) VALUES (?, ?, '', ?)")
            .bind(&id)
            .bind(name)
            .bind(Utc::now())
            .execute(pool)
            .await
            .unwrap();
        id
    }

    fn topic_request(category_id: &str) -> CreateTopicRequest {
        CreateTopicRequest {
            category_id: category_id.to_string(),
            title: "سؤال عن أوقات الصلاة".to_string(),
            body: "ما هو أفضل مصدر لمعرفة أوقات الصلاة في مدينتي؟".to_string(),
        }
    }

    #[tokio::test]
    async fn topic_round_trip() {
        let pool = test_pool().await;
        let author = seed_user(&pool, "a@example.com").await;
        let category = seed_category(&pool, "أسئلة عامة").await;
        let service = ForumService::new(&pool);

        let topic = service
            .create_topic(&author, topic_request(&category))
            .await
            .unwrap();

        let (fetched, comments) = service.get_topic(&topic.id).await.unwrap();
        assert_eq!(fetched.id, topic.id);
        assert!(comments.is_empty());

        let (listed, total) = service
            .list_topics(&category, &PaginationFilter::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(listed[0].id, topic.id);
    }

    #[tokio::test]
    async fn create_topic_requires_existing_category() {
        let pool = test_pool().await;
        let author = seed_user(&pool, "a@example.com").await;
        let service = ForumService::new(&pool);

        assert!(matches!(
            service.create_topic(&author, topic_request("missing")).await,
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn comments_are_listed_oldest_first() {
        let pool = test_pool().await;
        let author = seed_user(&pool, "a@example.com").await;
        let category = seed_category(&pool, "نقاش").await;
        let service = ForumService::new(&pool);

        let topic = service
            .create_topic(&author, topic_request(&category))
            .await
            .unwrap();

        for body in ["الرد الأول", "الرد الثاني"] {
            service
                .add_comment(
                    &author,
                    &topic.id,
                    CreateCommentRequest {
                        body: body.to_string(),
                    },
                )
                .await
                .unwrap();
        }

        let (_, comments) = service.get_topic(&topic.id).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].body, "الرد الأول");
    }

    #[tokio::test]
    async fn only_the_author_can_delete_a_topic() {
        let pool = test_pool().await;
        let author = seed_user(&pool, "a@example.com").await;
        let other = seed_user(&pool, "b@example.com").await;
        let category = seed_category(&pool, "نقاش").await;
        let service = ForumService::new(&pool);

        let topic = service
            .create_topic(&author, topic_request(&category))
            .await
            .unwrap();

        assert!(matches!(
            service.delete_topic(&other, &topic.id).await,
            Err(ServiceError::PermissionDenied { .. })
        ));

        service.delete_topic(&author, &topic.id).await.unwrap();

        // Soft-deleted topics disappear from reads.
        assert!(matches!(
            service.get_topic(&topic.id).await,
            Err(ServiceError::NotFound { .. })
        ));
    }
}
