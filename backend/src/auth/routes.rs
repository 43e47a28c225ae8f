//! Defines the HTTP routes specifically for authentication.
//!
//! These routes handle the account lifecycle: registration, activation,
//! login, logout and password reset. They are designed to be integrated
//! into the main Axum router.

use crate::auth::handlers::*;
use crate::auth::middleware::*;
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Creates the authentication router with all auth-related routes
pub fn auth_router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/activate", get(activate))
        .route("/resend-activation", post(resend_activation))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/reset-password", post(reset_password))
        .route("/update-password", post(update_password))
        .route("/me", get(me).layer(middleware::from_fn(session_auth)))
}
