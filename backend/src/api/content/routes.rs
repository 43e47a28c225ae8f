//! Defines the HTTP routes for static content and prayer times.
//!
//! All content routes are public reads.

use super::handlers::{
    get_adhkar, get_hisn, get_surah, list_adhkar, list_hisn, list_surahs, prayer_times,
};
use axum::{Router, routing::get};

pub fn content_router() -> Router {
    Router::new()
        .route("/quran", get(list_surahs))
        .route("/quran/{number}", get(get_surah))
        .route("/adhkar", get(list_adhkar))
        .route("/adhkar/{id}", get(get_adhkar))
        .route("/hisnmuslim", get(list_hisn))
        .route("/hisnmuslim/{id}", get(get_hisn))
        .route("/prayer", get(prayer_times))
}
