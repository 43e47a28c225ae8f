//! Handler functions for authentication-related API endpoints.
//!
//! These functions process incoming HTTP requests for the account lifecycle
//! (registration, activation, login, logout, password reset), parse request
//! data, and interact with `services::auth_service` for core business logic.

use crate::api::common::{ApiResponse, service_error_to_http};
use crate::auth::middleware::{SESSION_COOKIE_NAME, extract_session_token};
use crate::auth::models::*;
use crate::config::Config;
use crate::services::auth_service::AuthService;
use axum::{
    extract::{Extension, Json, Query},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Json as ResponseJson},
};
use sqlx::SqlitePool;
use std::sync::Arc;

fn user_info(user: crate::database::models::User) -> UserInfo {
    UserInfo {
        id: user.id,
        email: user.email,
        display_name: user.display_name,
        status: user.status,
    }
}

/// Handle account registration request
#[axum::debug_handler]
pub async fn register(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<ResponseJson<ApiResponse<RegisterResponse>>, (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, &config);

    match auth_service.register(payload).await {
        Ok(user) => Ok(ResponseJson(ApiResponse::success(
            RegisterResponse { user_id: user.id },
            "Registration successful. Check your email for the activation link.",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle account activation via the emailed token link
#[axum::debug_handler]
pub async fn activate(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    Query(params): Query<ActivateQuery>,
) -> Result<ResponseJson<ApiResponse<UserInfo>>, (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, &config);

    match auth_service.activate(&params.token).await {
        Ok(user) => Ok(ResponseJson(ApiResponse::success(
            user_info(user),
            "Account activated. You can now log in.",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle activation-email resend request
#[axum::debug_handler]
pub async fn resend_activation(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    Json(payload): Json<ResendActivationRequest>,
) -> Result<ResponseJson<ApiResponse<()>>, (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, &config);

    match auth_service.resend_activation(&payload.email).await {
        Ok(()) => Ok(ResponseJson(ApiResponse::success(
            (),
            "If a pending account exists for this email, a new activation link has been sent.",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle user login request
#[axum::debug_handler]
pub async fn login(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, &config);

    match auth_service.login(payload).await {
        Ok((session, user)) => {
            let cookie = format!(
                "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
                SESSION_COOKIE_NAME, session.token, config.session_ttl_seconds
            );
            let response = LoginResponse {
                session_token: session.token,
                user: user_info(user),
                expires_in: config.session_ttl_seconds,
            };

            Ok((
                [(SET_COOKIE, cookie)],
                ResponseJson(ApiResponse::success(response, "Login successful")),
            ))
        }
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle logout request. Always succeeds, with or without a session.
#[axum::debug_handler]
pub async fn logout(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Some(token) = extract_session_token(&headers) {
        let auth_service = AuthService::new(&pool, &config);
        if let Err(error) = auth_service.logout(&token).await {
            return Err(service_error_to_http(error));
        }
    }

    // Expire the cookie regardless of whether a session existed.
    let cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        SESSION_COOKIE_NAME
    );

    Ok((
        [(SET_COOKIE, cookie)],
        ResponseJson(ApiResponse::success((), "Logged out successfully")),
    ))
}

/// Handle password-reset request. The response never reveals whether the
/// email has an account.
#[axum::debug_handler]
pub async fn reset_password(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<ResponseJson<ApiResponse<()>>, (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, &config);

    match auth_service.request_password_reset(&payload.email).await {
        Ok(()) => Ok(ResponseJson(ApiResponse::success(
            (),
            "If an account exists for this email, a password reset link has been sent.",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle password update with a reset token
#[axum::debug_handler]
pub async fn update_password(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<ResponseJson<ApiResponse<()>>, (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, &config);

    match auth_service.update_password(payload).await {
        Ok(()) => Ok(ResponseJson(ApiResponse::success(
            (),
            "Password updated. Please log in with your new password.",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Get current user information from the session
#[axum::debug_handler]
pub async fn me(
    Extension(current_user): Extension<CurrentUser>,
) -> Result<ResponseJson<ApiResponse<UserInfo>>, (StatusCode, String)> {
    // The session middleware only admits active accounts.
    Ok(ResponseJson(ApiResponse::ok(UserInfo {
        id: current_user.user_id,
        email: current_user.email,
        display_name: current_user.display_name,
        status: crate::database::models::AccountStatus::Active,
    })))
}
