//! Data structures for authentication-related entities.
//!
//! This module defines request and response payloads for the account
//! lifecycle (registration, activation, login, password reset) and the
//! identity attached to authenticated requests.

use crate::database::models::AccountStatus;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Registration request payload
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        email(message = "Must be a valid email"),
        length(max = 255, message = "Email too long")
    )]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Display name must be between 1-255 characters"
    ))]
    pub display_name: String,
}

/// Registration response: the new account id only. The caller is not
/// authenticated until the account has been activated and logged in.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: String,
}

/// Activation link query (`GET /auth/activate?token=`)
#[derive(Debug, Deserialize)]
pub struct ActivateQuery {
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResendActivationRequest {
    #[validate(email(message = "Must be a valid email"))]
    pub email: String,
}

/// Login request payload
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response containing the opaque session token and user info
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub session_token: String,
    pub user: UserInfo,
    pub expires_in: u64, // Session expiration in seconds
}

/// User information returned to authenticated callers
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub status: AccountStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email(message = "Must be a valid email"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub new_password: String,
}

/// Identity injected into request extensions by the session middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
}
