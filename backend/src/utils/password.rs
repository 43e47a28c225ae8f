//! Password hashing, verification and strength policy.

use crate::errors::{ServiceError, ServiceResult};
use bcrypt::{DEFAULT_COST, hash, verify};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Function to hash a password before storing in database
pub fn hash_password(password: &str) -> ServiceResult<String> {
    hash(password, DEFAULT_COST)
        .map_err(|e| ServiceError::validation(format!("Password hashing failed: {}", e)))
}

/// Function to verify a password against the stored hash
pub fn verify_password(password: &str, hash: &str) -> ServiceResult<bool> {
    verify(password, hash)
        .map_err(|e| ServiceError::validation(format!("Password verification failed: {}", e)))
}

/// Strength policy: at least [`MIN_PASSWORD_LENGTH`] characters, with at
/// least one letter and one digit.
pub fn check_password_policy(password: &str) -> ServiceResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ServiceError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err(ServiceError::validation(
            "Password must contain at least one letter",
        ));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ServiceError::validation(
            "Password must contain at least one digit",
        ));
    }

    Ok(())
}
