//! Main entry point for the Kanzislam backend.
//!
//! This file initializes the Axum web server, sets up the database and the
//! in-memory content store, and registers all API routes and middleware.
//! It orchestrates the application's startup and defines its overall structure.

mod api;
mod auth;
mod config;
mod content;
mod database;
mod errors;
mod repositories;
mod services;
mod utils;

use crate::api::common::ApiResponse;
use crate::content::ContentStore;
use crate::content::prayer::PrayerTimesClient;
use crate::services::session_service::SessionService;
use crate::services::token_service::TokenService;
use axum::{Extension, Router, response::Json, routing::get};
use config::Config;
use database::Database;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::fmt::init;

/// How often expired tokens and sessions are garbage-collected.
const GC_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() {
    init();

    let config = Config::from_env().unwrap();
    let db = Database::new(&config).await.unwrap();
    db.run_migrations().await.unwrap();
    let pool = db.pool().clone();

    let content = Arc::new(ContentStore::load(&config.data_dir).unwrap());
    let prayer_client = PrayerTimesClient::new();
    let shared_config = Arc::new(config.clone());

    tokio::spawn(expiry_gc_loop(pool.clone(), shared_config.clone()));

    let app = Router::new()
        .route("/", get(root_handler))
        .nest("/auth", auth::routes::auth_router())
        .nest("/api/forum", api::forum::routes::forum_router())
        .nest("/api", api::content::routes::content_router())
        .layer(Extension(pool))
        .layer(Extension(shared_config))
        .layer(Extension(content))
        .layer(Extension(prayer_client));

    let bind_address = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_address).await.unwrap();

    info!("Starting Kanzislam server on port {}", config.server_port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    info!("Server closed.");
}

async fn root_handler() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(
        serde_json::json!({
            "service": "Kanzislam Backend",
            "version": "0.1.0"
        }),
        "Welcome to the Kanzislam API",
    ))
}

/// Periodically removes expired tokens and sessions.
async fn expiry_gc_loop(pool: SqlitePool, config: Arc<Config>) {
    let mut interval = tokio::time::interval(GC_INTERVAL);

    loop {
        interval.tick().await;

        let token_service = TokenService::new(&pool);
        match token_service.purge_expired().await {
            Ok(0) => {}
            Ok(removed) => info!("Purged {} expired token(s)", removed),
            Err(e) => tracing::error!("Token purge failed: {}", e),
        }

        let session_service = SessionService::new(&pool, &config);
        match session_service.purge_expired().await {
            Ok(0) => {}
            Ok(removed) => info!("Purged {} expired session(s)", removed),
            Err(e) => tracing::error!("Session purge failed: {}", e),
        }
    }
}

/// Resolves when SIGINT or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("SIGINT signal received."),
        () = terminate => info!("SIGTERM signal received."),
    }
}
