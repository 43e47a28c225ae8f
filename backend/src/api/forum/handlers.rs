//! Handler functions for forum endpoints.
//!
//! These functions process requests for categories, topics and comments and
//! interact with `services::forum_service` for the business logic.

use crate::api::common::{ApiResponse, PaginationFilter, PaginationMeta, service_error_to_http};
use crate::auth::models::CurrentUser;
use crate::database::models::{
    Category, Comment, CreateCommentRequest, CreateTopicRequest, Topic,
};
use crate::services::forum_service::ForumService;
use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Debug, Deserialize)]
pub struct ListTopicsQuery {
    pub category_id: String,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct TopicWithComments {
    pub topic: Topic,
    pub comments: Vec<Comment>,
}

/// Lists the forum categories.
#[axum::debug_handler]
pub async fn list_categories(
    Extension(pool): Extension<SqlitePool>,
) -> Result<Json<ApiResponse<Vec<Category>>>, (StatusCode, String)> {
    let service = ForumService::new(&pool);

    match service.list_categories().await {
        Ok(categories) => Ok(Json(ApiResponse::ok(categories))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle topic creation request
#[axum::debug_handler]
pub async fn create_topic(
    Extension(pool): Extension<SqlitePool>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<CreateTopicRequest>,
) -> Result<Json<ApiResponse<Topic>>, (StatusCode, String)> {
    let service = ForumService::new(&pool);

    match service.create_topic(&current_user.user_id, payload).await {
        Ok(topic) => Ok(Json(ApiResponse::success(
            topic,
            "Topic created successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Lists topics in a category, newest first, paginated.
#[axum::debug_handler]
pub async fn list_topics(
    Extension(pool): Extension<SqlitePool>,
    Query(query): Query<ListTopicsQuery>,
) -> Result<Json<ApiResponse<Vec<Topic>>>, (StatusCode, String)> {
    let service = ForumService::new(&pool);
    let pagination = PaginationFilter {
        page: query.page,
        per_page: query.per_page,
    };

    match service.list_topics(&query.category_id, &pagination).await {
        Ok((topics, total)) => {
            let meta = PaginationMeta::from_filter(&pagination, total);
            Ok(Json(ApiResponse::paginated(
                topics,
                meta,
                "Request successful",
            )))
        }
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Retrieves a topic together with its comment thread.
#[axum::debug_handler]
pub async fn get_topic(
    Extension(pool): Extension<SqlitePool>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TopicWithComments>>, (StatusCode, String)> {
    let service = ForumService::new(&pool);

    match service.get_topic(&id).await {
        Ok((topic, comments)) => Ok(Json(ApiResponse::ok(TopicWithComments { topic, comments }))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle comment creation request
#[axum::debug_handler]
pub async fn add_comment(
    Extension(pool): Extension<SqlitePool>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<Json<ApiResponse<Comment>>, (StatusCode, String)> {
    let service = ForumService::new(&pool);

    match service.add_comment(&current_user.user_id, &id, payload).await {
        Ok(comment) => Ok(Json(ApiResponse::success(
            comment,
            "Comment added successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle topic deletion request (author only, soft delete)
#[axum::debug_handler]
pub async fn delete_topic(
    Extension(pool): Extension<SqlitePool>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, (StatusCode, String)> {
    let service = ForumService::new(&pool);

    match service.delete_topic(&current_user.user_id, &id).await {
        Ok(()) => Ok(Json(ApiResponse::success((), "Topic deleted"))),
        Err(error) => Err(service_error_to_http(error)),
    }
}
