//! Middleware for protecting authenticated routes.
//!
//! Resolves the opaque session token (from the `Authorization: Bearer`
//! header or the session cookie) into a `CurrentUser` request extension via
//! the server-side session store.

use crate::auth::models::CurrentUser;
use crate::config::Config;
use crate::services::session_service::SessionService;
use axum::{
    extract::{Extension, Request},
    http::{
        HeaderMap, StatusCode,
        header::{AUTHORIZATION, COOKIE},
    },
    middleware::Next,
    response::Response,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Name of the browser session cookie.
pub const SESSION_COOKIE_NAME: &str = "kanz_session";

/// Pulls the session token out of the Authorization header or cookie.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    let cookie_header = headers.get(COOKIE).and_then(|h| h.to_str().ok())?;
    cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(&format!("{SESSION_COOKIE_NAME}=")))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Session authentication middleware
pub async fn session_auth(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token =
        extract_session_token(request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    let session_service = SessionService::new(&pool, &config);

    match session_service.authenticate(&token).await {
        Ok(Some((_, user))) => {
            // Add the identity to request extensions for use in handlers
            request.extensions_mut().insert(CurrentUser {
                user_id: user.id,
                email: user.email,
                display_name: user.display_name,
            });
            Ok(next.run(request).await)
        }
        Ok(None) => Err(StatusCode::UNAUTHORIZED),
        Err(e) => {
            tracing::error!("Session lookup failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        headers.insert(
            COOKIE,
            HeaderValue::from_static("kanz_session=from-cookie"),
        );

        assert_eq!(extract_session_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn session_cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; kanz_session=tok42; lang=ar"),
        );

        assert_eq!(extract_session_token(&headers).as_deref(), Some("tok42"));
    }

    #[test]
    fn missing_token_yields_none() {
        let headers = HeaderMap::new();
        assert!(extract_session_token(&headers).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark"));
        assert!(extract_session_token(&headers).is_none());
    }
}
