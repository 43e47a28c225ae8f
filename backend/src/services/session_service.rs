//! Session management: binding opaque browser tokens to identities.
//!
//! Sessions are server-side rows; the browser only ever holds the opaque
//! token. Password changes invalidate every session for the affected user.

use crate::config::Config;
use crate::database::models::{AccountStatus, Session, User};
use crate::errors::ServiceResult;
use crate::repositories::session_repository::SessionRepository;
use crate::repositories::user_repository::UserRepository;
use crate::utils::random::{TOKEN_LENGTH, generate_random_string};
use chrono::{Duration, Utc};
use sqlx::SqlitePool;

pub struct SessionService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
    config: &'a Config,
}

impl<'a> SessionService<'a> {
    pub fn new(pool: &'a SqlitePool, config: &'a Config) -> Self {
        Self { pool, config }
    }

    /// Creates an authenticated session for a user and returns it with the
    /// opaque token the browser should present on subsequent requests.
    pub async fn establish(&self, user_id: &str) -> ServiceResult<Session> {
        let repo = SessionRepository::new(self.pool);
        let token = generate_random_string(TOKEN_LENGTH);
        let expires_at = Utc::now() + Duration::seconds(self.config.session_ttl_seconds as i64);

        let session = repo.create_session(&token, user_id, expires_at).await?;
        Ok(session)
    }

    /// Resolves a presented session token into an authenticated identity.
    ///
    /// Returns `Ok(None)` for unknown, expired, anonymous (logged-out) or
    /// disabled-user sessions; only hard store failures are errors.
    pub async fn authenticate(&self, token: &str) -> ServiceResult<Option<(Session, User)>> {
        let session_repo = SessionRepository::new(self.pool);

        let Some(session) = session_repo.get_by_token(token).await? else {
            return Ok(None);
        };

        let Some(user_id) = session.user_id.clone() else {
            return Ok(None);
        };

        let user_repo = UserRepository::new(self.pool);
        let Some(user) = user_repo.get_user_by_id(&user_id).await? else {
            return Ok(None);
        };

        if user.status != AccountStatus::Active {
            return Ok(None);
        }

        session_repo.touch(&session.id).await?;

        Ok(Some((session, user)))
    }

    /// Clears the user binding for one session token. Unknown tokens are
    /// treated as success; logout never fails.
    pub async fn clear(&self, token: &str) -> ServiceResult<()> {
        let repo = SessionRepository::new(self.pool);
        repo.clear_binding(token).await?;
        Ok(())
    }

    /// Clears every session binding for a user, forcing re-login everywhere.
    pub async fn invalidate_all(&self, user_id: &str) -> ServiceResult<u64> {
        let repo = SessionRepository::new(self.pool);
        let cleared = repo.invalidate_all_for_user(user_id).await?;
        Ok(cleared)
    }

    /// Removes expired session rows. Returns the number of rows deleted.
    pub async fn purge_expired(&self) -> ServiceResult<u64> {
        let repo = SessionRepository::new(self.pool);
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

    async fn seed_active_user(pool: &SqlitePool, email: &str) -> String {
        let repo = UserRepository::new(pool);
        let user = repo
            .create_user(CreateUser {
                email: email.to_string(),
                password_hash: "x".to_string(),
                display_name: "Test".to_string(),
            })
            .await
            .unwrap();
        repo.update_status(&user.id, AccountStatus::Active)
            .await
            .unwrap();
        user.id
    }

    #[tokio::test]
    async fn established_session_authenticates() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let user_id = seed_active_user(&pool, "a@example.com").await;
        let service = SessionService::new(&pool, &config);

        let session = service.establish(&user_id).await.unwrap();
        let resolved = service.authenticate(&session.token).await.unwrap();

        let (_, user) = resolved.expect("session should authenticate");
        assert_eq!(user.id, user_id);
    }

    #[tokio::test]
    async fn cleared_session_is_anonymous() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let user_id = seed_active_user(&pool, "a@example.com").await;
        let service = SessionService::new(&pool, &config);

        let session = service.establish(&user_id).await.unwrap();
        service.clear(&session.token).await.unwrap();

        assert!(service.authenticate(&session.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_of_unknown_token_succeeds() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let service = SessionService::new(&pool, &config);

        assert!(service.clear("never-issued").await.is_ok());
    }

    #[tokio::test]
    async fn invalidate_all_clears_every_session() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let user_id = seed_active_user(&pool, "a@example.com").await;
        let service = SessionService::new(&pool, &config);

        let first = service.establish(&user_id).await.unwrap();
        let second = service.establish(&user_id).await.unwrap();

        let cleared = service.invalidate_all(&user_id).await.unwrap();

        assert_eq!(cleared, 2);
        assert!(service.authenticate(&first.token).await.unwrap().is_none());
        assert!(service.authenticate(&second.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn disabled_user_session_does_not_authenticate() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let user_id = seed_active_user(&pool, "a@example.com").await;
        let service = SessionService::new(&pool, &config);

        let session = service.establish(&user_id).await.unwrap();

        let repo = UserRepository::new(&pool);
        repo.disable_user(&user_id).await.unwrap();

        assert!(service.authenticate(&session.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn pending_user_session_does_not_authenticate() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let repo = UserRepository::new(&pool);
        let user = repo
            .create_user(CreateUser {
                email: "p@example.com".to_string(),
                password_hash: "x".to_string(),
                display_name: "Pending".to_string(),
            })
            .await
            .unwrap();
        let service = SessionService::new(&pool, &config);

        let session = service.establish(&user.id).await.unwrap();

        assert!(service.authenticate(&session.token).await.unwrap().is_none());
    }
}
