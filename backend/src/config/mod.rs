//! Central module for application-wide configuration settings.
//!
//! Configuration is loaded once at startup from the environment and passed
//! by reference to every component that needs it; nothing below `main`
//! re-reads the environment.

use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub server_port: u16,
    /// Public base URL used when building activation / reset links in emails.
    pub base_url: String,
    pub website_name: String,
    /// Directory holding the synced content data files (quran.json, ...).
    pub data_dir: String,
    pub session_ttl_seconds: u64,
    pub activation_token_ttl_seconds: u64,
    pub reset_token_ttl_seconds: u64,
    email: Option<EmailConfig>,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_name: String,
    pub from_email: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = env::var("DB_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u64>()
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid number")?;

        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| format!("http://localhost:{server_port}"));

        let website_name = env::var("WEBSITE_NAME").unwrap_or_else(|_| "Kanzislam".to_string());

        let data_dir = env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let session_ttl_seconds = env::var("SESSION_TTL_SECONDS")
            .unwrap_or_else(|_| "604800".to_string())
            .parse::<u64>()
            .context("SESSION_TTL_SECONDS must be a valid number")?;

        let activation_token_ttl_seconds = env::var("ACTIVATION_TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse::<u64>()
            .context("ACTIVATION_TOKEN_TTL_SECONDS must be a valid number")?;

        let reset_token_ttl_seconds = env::var("RESET_TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse::<u64>()
            .context("RESET_TOKEN_TTL_SECONDS must be a valid number")?;

        let email = Self::email_from_env()?;

        Ok(Config {
            database_url,
            max_connections,
            acquire_timeout_seconds,
            server_port,
            base_url,
            website_name,
            data_dir,
            session_ttl_seconds,
            activation_token_ttl_seconds,
            reset_token_ttl_seconds,
            email,
        })
    }

    /// SMTP settings are optional: without them the server runs with email
    /// notifications disabled instead of refusing to start.
    fn email_from_env() -> Result<Option<EmailConfig>> {
        let smtp_host = match env::var("SMTP_HOST") {
            Ok(host) => host,
            Err(_) => return Ok(None),
        };

        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse::<u16>()
            .context("SMTP_PORT must be a valid number")?;

        let smtp_username = env::var("SMTP_USER").context("SMTP_USER not set")?;
        let smtp_password = env::var("SMTP_PASS").context("SMTP_PASS not set")?;

        let from_name = env::var("SMTP_DISPLAY_NAME").unwrap_or_else(|_| "Kanzislam".to_string());
        let from_email = env::var("SMTP_FROM").unwrap_or_else(|_| smtp_username.clone());

        Ok(Some(EmailConfig {
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password,
            from_name,
            from_email,
        }))
    }

    pub fn email_config(&self) -> Option<EmailConfig> {
        self.email.clone()
    }

    /// Configuration for tests and tooling that never touches the
    /// environment or sends email.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            acquire_timeout_seconds: 3,
            server_port: 0,
            base_url: "http://localhost:3000".to_string(),
            website_name: "Kanzislam".to_string(),
            data_dir: "./data".to_string(),
            session_ttl_seconds: 604_800,
            activation_token_ttl_seconds: 86_400,
            reset_token_ttl_seconds: 3_600,
            email: None,
        }
    }
}
