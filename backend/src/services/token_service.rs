//! Issuance and validation of one-shot credential-action tokens.
//!
//! Validation is side-effect-free: consuming a token is a separate, explicit
//! step performed only after the state change the token authorizes has
//! succeeded, so a failed downstream write never burns the token.

use crate::database::models::{AuthToken, TokenPurpose};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::token_repository::TokenRepository;
use crate::utils::random::{TOKEN_LENGTH, generate_random_string};
use chrono::{Duration, Utc};
use sqlx::SqlitePool;

pub struct TokenService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> TokenService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Mints a fresh token for the given user and purpose.
    ///
    /// Any prior unconsumed token of the same (user, purpose) pair is retired
    /// in the same transaction, so at most one token per pair is ever live.
    pub async fn issue(
        &self,
        user_id: &str,
        purpose: TokenPurpose,
        ttl: Duration,
    ) -> ServiceResult<AuthToken> {
        let repo = TokenRepository::new(self.pool);
        let value = generate_random_string(TOKEN_LENGTH);
        let expires_at = Utc::now() + ttl;

        let token = repo.create_token(user_id, &value, purpose, expires_at).await?;
        Ok(token)
    }

    /// Checks a presented token without consuming it.
    ///
    /// All failure reasons (unknown, consumed, expired, wrong purpose)
    /// collapse into the same `InvalidToken` error.
    pub async fn validate(&self, token: &str, purpose: TokenPurpose) -> ServiceResult<AuthToken> {
        let repo = TokenRepository::new(self.pool);

        let token = repo
            .get_by_token(token)
            .await?
            .ok_or(ServiceError::InvalidToken)?;

        if token.consumed || token.purpose != purpose || token.expires_at <= Utc::now() {
            return Err(ServiceError::InvalidToken);
        }

        Ok(token)
    }

    /// Marks a validated token consumed. Fails with `InvalidToken` if it was
    /// already consumed in the meantime.
    pub async fn consume(&self, token_id: &str) -> ServiceResult<()> {
        let repo = TokenRepository::new(self.pool);

        if !repo.consume(token_id).await? {
            return Err(ServiceError::InvalidToken);
        }

        Ok(())
    }

    /// Removes expired tokens. Returns the number of rows deleted.
    pub async fn purge_expired(&self) -> ServiceResult<u64> {
        let repo = TokenRepository::new(self.pool);
        let removed = repo.delete_expired(Utc::now()).await?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::CreateUser;
    use crate::database::test_pool;
    use crate::repositories::user_repository::UserRepository;

    async fn seed_user(pool: &SqlitePool, email: &str) -> String {
        let repo = UserRepository::new(pool);
        let user = repo
            .create_user(CreateUser {
                email: email.to_string(),
                password_hash: "x".to_string(),
                display_name: "Test".to_string(),
            })
            .await
            .unwrap();
        user.id
    }

    #[tokio::test]
    async fn issued_token_validates_for_its_purpose_only() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool, "a@example.com").await;
        let service = TokenService::new(&pool);

        let token = service
            .issue(&user_id, TokenPurpose::Activate, Duration::hours(24))
            .await
            .unwrap();

        assert!(
            service
                .validate(&token.token, TokenPurpose::Activate)
                .await
                .is_ok()
        );
        assert!(matches!(
            service
                .validate(&token.token, TokenPurpose::ResetPassword)
                .await,
            Err(ServiceError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let pool = test_pool().await;
        let service = TokenService::new(&pool);

        assert!(matches!(
            service.validate("no-such-token", TokenPurpose::Activate).await,
            Err(ServiceError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn expired_token_is_invalid() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool, "a@example.com").await;
        let service = TokenService::new(&pool);

        let token = service
            .issue(&user_id, TokenPurpose::Activate, Duration::seconds(-10))
            .await
            .unwrap();

        assert!(matches!(
            service.validate(&token.token, TokenPurpose::Activate).await,
            Err(ServiceError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn consumption_is_one_shot() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool, "a@example.com").await;
        let service = TokenService::new(&pool);

        let token = service
            .issue(&user_id, TokenPurpose::ResetPassword, Duration::hours(1))
            .await
            .unwrap();

        service.consume(&token.id).await.unwrap();

        assert!(matches!(
            service.consume(&token.id).await,
            Err(ServiceError::InvalidToken)
        ));
        assert!(matches!(
            service
                .validate(&token.token, TokenPurpose::ResetPassword)
                .await,
            Err(ServiceError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn reissue_invalidates_prior_token() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool, "a@example.com").await;
        let service = TokenService::new(&pool);

        let first = service
            .issue(&user_id, TokenPurpose::Activate, Duration::hours(24))
            .await
            .unwrap();
        let second = service
            .issue(&user_id, TokenPurpose::Activate, Duration::hours(24))
            .await
            .unwrap();

        assert!(matches!(
            service.validate(&first.token, TokenPurpose::Activate).await,
            Err(ServiceError::InvalidToken)
        ));
        assert!(
            service
                .validate(&second.token, TokenPurpose::Activate)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn reissue_leaves_other_purposes_alone() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool, "a@example.com").await;
        let service = TokenService::new(&pool);

        let reset = service
            .issue(&user_id, TokenPurpose::ResetPassword, Duration::hours(1))
            .await
            .unwrap();
        service
            .issue(&user_id, TokenPurpose::Activate, Duration::hours(24))
            .await
            .unwrap();

        assert!(
            service
                .validate(&reset.token, TokenPurpose::ResetPassword)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn purge_removes_only_expired_tokens() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool, "a@example.com").await;
        let other_id = seed_user(&pool, "b@example.com").await;
        let service = TokenService::new(&pool);

        service
            .issue(&user_id, TokenPurpose::Activate, Duration::seconds(-10))
            .await
            .unwrap();
        let live = service
            .issue(&other_id, TokenPurpose::Activate, Duration::hours(24))
            .await
            .unwrap();

        let removed = service.purge_expired().await.unwrap();

        assert_eq!(removed, 1);
        assert!(
            service
                .validate(&live.token, TokenPurpose::Activate)
                .await
                .is_ok()
        );
    }
}
