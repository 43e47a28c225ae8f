//! Persistence boundary: one repository per entity.
//!
//! Repositories own all SQL for their entity and return `anyhow::Result`;
//! services translate failures into `ServiceError` kinds. Queries are
//! runtime-checked (`sqlx::query_as` with binds) so the crate builds without
//! a live database.

pub mod forum_repository;
pub mod session_repository;
pub mod token_repository;
pub mod user_repository;
