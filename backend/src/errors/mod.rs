//! Global application error types and handlers.
//!
//! This module defines custom error types that are used across the entire
//! backend application and provides mechanisms for consistent error handling
//! and response formatting.

use thiserror::Error;

/// Generic service error that can be used across all entities
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Bad credentials. Carries no detail about which field was wrong so the
    /// response cannot be used to probe for accounts.
    #[error("Invalid email or password")]
    Authentication,

    /// Credentials were correct but the account has not been activated yet.
    /// Kept separate from `Authentication` so the UI can offer a resend link.
    #[error("Account is not activated")]
    NotActivated,

    /// Unknown, expired, consumed or purpose-mismatched token. One uniform
    /// message for all four reasons; distinguishing them would give a
    /// token-guessing caller an oracle.
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("{entity} already exists: {identifier}")]
    Conflict { entity: String, identifier: String },

    #[error("{entity} not found: {identifier}")]
    NotFound { entity: String, identifier: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Database error: {source}")]
    Database {
        #[from]
        source: anyhow::Error,
    },

    #[error("External service error: {message}")]
    ExternalService { message: String },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    // Helper constructors for common patterns

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(entity: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::Conflict {
            entity: entity.into(),
            identifier: identifier.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            identifier: identifier.into(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    pub fn external_service(message: impl Into<String>) -> Self {
        Self::ExternalService {
            message: message.into(),
        }
    }

    /// Flattens `validator` field errors into a single `Validation` error.
    pub fn from_validation(validation_errors: validator::ValidationErrors) -> Self {
        let error_messages: Vec<String> = validation_errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    format!(
                        "{}: {}",
                        field,
                        error.message.as_ref().unwrap_or(&"Invalid value".into())
                    )
                })
            })
            .collect();

        Self::Validation {
            message: error_messages.join(", "),
        }
    }
}
