//! Defines the HTTP routes for the forum.
//!
//! Reads are public; creating or deleting topics and comments requires an
//! authenticated session.

use super::handlers::{
    add_comment, create_topic, delete_topic, get_topic, list_categories, list_topics,
};
use crate::auth::middleware::session_auth;
use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

pub fn forum_router() -> Router {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/topics", get(list_topics))
        .route(
            "/topics",
            post(create_topic).layer(middleware::from_fn(session_auth)),
        )
        .route("/topics/{id}", get(get_topic))
        .route(
            "/topics/{id}",
            delete(delete_topic).layer(middleware::from_fn(session_auth)),
        )
        .route(
            "/topics/{id}/comments",
            post(add_comment).layer(middleware::from_fn(session_auth)),
        )
}
