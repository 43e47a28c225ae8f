//! Handler functions for static content endpoints.
//!
//! Quran, adhkar and Hisn al-Muslim lookups are plain reads against the
//! in-memory content store; prayer times go through the cached upstream
//! client.

use crate::api::common::{ApiResponse, service_error_to_http};
use crate::content::prayer::{PrayerTimes, PrayerTimesClient};
use crate::content::{AdhkarSection, ContentStore, HisnChapter, Surah};
use crate::errors::ServiceError;
use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct PrayerQuery {
    pub city: String,
    pub country: String,
}

/// Lists the surah index.
#[axum::debug_handler]
pub async fn list_surahs(
    Extension(store): Extension<Arc<ContentStore>>,
) -> Json<ApiResponse<Vec<Surah>>> {
    Json(ApiResponse::ok(store.list_surahs().to_vec()))
}

/// Retrieves one surah by number (1-114).
#[axum::debug_handler]
pub async fn get_surah(
    Extension(store): Extension<Arc<ContentStore>>,
    Path(number): Path<u32>,
) -> Result<Json<ApiResponse<Surah>>, (StatusCode, String)> {
    match store.get_surah(number) {
        Some(surah) => Ok(Json(ApiResponse::ok(surah.clone()))),
        None => Err(service_error_to_http(ServiceError::not_found(
            "Surah",
            number.to_string(),
        ))),
    }
}

/// Lists the adhkar sections.
#[axum::debug_handler]
pub async fn list_adhkar(
    Extension(store): Extension<Arc<ContentStore>>,
) -> Json<ApiResponse<Vec<AdhkarSection>>> {
    Json(ApiResponse::ok(store.list_adhkar().to_vec()))
}

/// Retrieves one adhkar section by id.
#[axum::debug_handler]
pub async fn get_adhkar(
    Extension(store): Extension<Arc<ContentStore>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<AdhkarSection>>, (StatusCode, String)> {
    match store.get_adhkar(&id) {
        Some(section) => Ok(Json(ApiResponse::ok(section.clone()))),
        None => Err(service_error_to_http(ServiceError::not_found("Adhkar", id))),
    }
}

/// Lists the Hisn al-Muslim chapters.
#[axum::debug_handler]
pub async fn list_hisn(
    Extension(store): Extension<Arc<ContentStore>>,
) -> Json<ApiResponse<Vec<HisnChapter>>> {
    Json(ApiResponse::ok(store.list_hisn().to_vec()))
}

/// Retrieves one Hisn al-Muslim chapter by id.
#[axum::debug_handler]
pub async fn get_hisn(
    Extension(store): Extension<Arc<ContentStore>>,
    Path(id): Path<u32>,
) -> Result<Json<ApiResponse<HisnChapter>>, (StatusCode, String)> {
    match store.get_hisn(id) {
        Some(chapter) => Ok(Json(ApiResponse::ok(chapter.clone()))),
        None => Err(service_error_to_http(ServiceError::not_found(
            "Chapter",
            id.to_string(),
        ))),
    }
}

/// Today's prayer times for a city.
#[axum::debug_handler]
pub async fn prayer_times(
    Extension(client): Extension<PrayerTimesClient>,
    Query(query): Query<PrayerQuery>,
) -> Result<Json<ApiResponse<PrayerTimes>>, (StatusCode, String)> {
    match client.timings_by_city(&query.city, &query.country).await {
        Ok(times) => Ok(Json(ApiResponse::ok(times))),
        Err(error) => Err(service_error_to_http(error)),
    }
}
