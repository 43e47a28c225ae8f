//! Core business logic for the account lifecycle.
//!
//! Orchestrates registration, activation, login/logout and password reset
//! across the user store, the token issuer, the session manager and the
//! email dispatcher. Email delivery runs off the request path: a failed
//! send is logged and retried, never surfaced to the caller, and never
//! rolls back the account change that triggered it.

use crate::auth::models::{LoginRequest, RegisterRequest, UpdatePasswordRequest};
use crate::config::Config;
use crate::database::models::{AccountStatus, CreateUser, Session, TokenPurpose, User};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::user_repository::UserRepository;
use crate::services::email_service::EmailService;
use crate::services::session_service::SessionService;
use crate::services::token_service::TokenService;
use crate::utils::normalize_email;
use crate::utils::password::{check_password_policy, hash_password, verify_password};
use chrono::Duration;
use sqlx::SqlitePool;
use validator::Validate;

/// Delivery attempts per email before giving up.
const MAX_EMAIL_ATTEMPTS: u32 = 3;
/// Initial backoff between attempts; doubled after each failure.
const EMAIL_RETRY_BASE: std::time::Duration = std::time::Duration::from_secs(5);

enum OutboundEmail {
    Activation { token: String },
    PasswordReset { token: String },
}

pub struct AuthService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
    config: &'a Config,
    /// Email service for transactional email, absent when SMTP is not configured
    email_service: Option<EmailService>,
}

impl<'a> AuthService<'a> {
    /// Creates a new AuthService instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    /// * `config` - Configuration constructed once at startup
    pub fn new(pool: &'a SqlitePool, config: &'a Config) -> Self {
        let email_service = match config.email_config() {
            Some(email_config) => {
                match EmailService::new(email_config, &config.base_url, &config.website_name) {
                    Ok(service) => Some(service),
                    Err(e) => {
                        tracing::warn!(
                            "Failed to initialize email service: {}. Email notifications will be disabled.",
                            e
                        );
                        None
                    }
                }
            }
            None => {
                tracing::warn!(
                    "Email configuration not found. Email notifications will be disabled."
                );
                None
            }
        };

        Self {
            pool,
            config,
            email_service,
        }
    }

    /// Registers a new account.
    ///
    /// The account starts as `Pending` and cannot log in until the emailed
    /// activation token is used. Returns the created user; the caller is not
    /// authenticated.
    pub async fn register(&self, request: RegisterRequest) -> ServiceResult<User> {
        if let Err(validation_errors) = request.validate() {
            return Err(ServiceError::from_validation(validation_errors));
        }

        check_password_policy(&request.password)?;

        let email = normalize_email(&request.email);

        let user_repo = UserRepository::new(self.pool);
        if user_repo.email_exists(&email).await? {
            return Err(ServiceError::validation("Email is already registered"));
        }

        let password_hash = hash_password(&request.password)?;

        // The uniqueness pre-check above is advisory; two concurrent
        // registrations are serialized by the UNIQUE constraint and the
        // loser gets a conflict here.
        let user = user_repo
            .create_user(CreateUser {
                email: email.clone(),
                password_hash,
                display_name: request.display_name,
            })
            .await
            .map_err(|e| map_user_create_error(e, &email))?;

        let token_service = TokenService::new(self.pool);
        let token = token_service
            .issue(
                &user.id,
                TokenPurpose::Activate,
                Duration::seconds(self.config.activation_token_ttl_seconds as i64),
            )
            .await?;

        self.spawn_email(
            user.email.clone(),
            user.display_name.clone(),
            OutboundEmail::Activation { token: token.token },
        );

        tracing::info!("Registered pending account {}", user.id);

        Ok(user)
    }

    /// Activates a pending account with its one-shot token.
    ///
    /// The token is consumed only after the status write succeeds, and a
    /// second attempt with the same token fails uniformly with
    /// `InvalidToken` whether or not the first attempt succeeded.
    pub async fn activate(&self, token: &str) -> ServiceResult<User> {
        let token_service = TokenService::new(self.pool);
        let token = token_service.validate(token, TokenPurpose::Activate).await?;

        let user_repo = UserRepository::new(self.pool);
        if !user_repo
            .update_status(&token.user_id, AccountStatus::Active)
            .await?
        {
            // The account behind the token has been disabled.
            return Err(ServiceError::InvalidToken);
        }

        token_service.consume(&token.id).await?;

        let user = user_repo
            .get_user_by_id(&token.user_id)
            .await?
            .ok_or(ServiceError::InvalidToken)?;

        tracing::info!("Activated account {}", user.id);

        Ok(user)
    }

    /// Issues a fresh activation token for a still-pending account.
    ///
    /// Always reports success so the endpoint cannot be used to discover
    /// which emails have accounts.
    pub async fn resend_activation(&self, email: &str) -> ServiceResult<()> {
        let email = normalize_email(email);

        let user_repo = UserRepository::new(self.pool);
        let Some(user) = user_repo.get_user_by_email(&email).await? else {
            return Ok(());
        };

        if user.status != AccountStatus::Pending {
            return Ok(());
        }

        let token_service = TokenService::new(self.pool);
        let token = token_service
            .issue(
                &user.id,
                TokenPurpose::Activate,
                Duration::seconds(self.config.activation_token_ttl_seconds as i64),
            )
            .await?;

        self.spawn_email(
            user.email,
            user.display_name,
            OutboundEmail::Activation { token: token.token },
        );

        Ok(())
    }

    /// Authenticates credentials and establishes a session.
    ///
    /// Unknown email and wrong password produce the same generic
    /// `Authentication` error; a correct login against a pending account
    /// produces the distinguishable `NotActivated` case so the UI can offer
    /// a resend.
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<(Session, User)> {
        if let Err(validation_errors) = request.validate() {
            return Err(ServiceError::from_validation(validation_errors));
        }

        let email = normalize_email(&request.email);

        let user_repo = UserRepository::new(self.pool);
        let user = user_repo
            .get_user_by_email(&email)
            .await?
            .ok_or(ServiceError::Authentication)?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(ServiceError::Authentication);
        }

        // Checked after password verification so this endpoint cannot be
        // used to probe which emails have pending accounts.
        if user.status == AccountStatus::Pending {
            return Err(ServiceError::NotActivated);
        }

        let session_service = SessionService::new(self.pool, self.config);
        let session = session_service.establish(&user.id).await?;

        Ok((session, user))
    }

    /// Clears the session's user binding. Never fails, even for unknown
    /// or already-anonymous session tokens.
    pub async fn logout(&self, session_token: &str) -> ServiceResult<()> {
        let session_service = SessionService::new(self.pool, self.config);
        session_service.clear(session_token).await
    }

    /// Starts the password-reset flow.
    ///
    /// Always reports success; a token is issued and emailed only when an
    /// active account exists for the address.
    pub async fn request_password_reset(&self, email: &str) -> ServiceResult<()> {
        let email = normalize_email(email);

        let user_repo = UserRepository::new(self.pool);
        let Some(user) = user_repo.get_user_by_email(&email).await? else {
            return Ok(());
        };

        if user.status != AccountStatus::Active {
            return Ok(());
        }

        let token_service = TokenService::new(self.pool);
        let token = token_service
            .issue(
                &user.id,
                TokenPurpose::ResetPassword,
                Duration::seconds(self.config.reset_token_ttl_seconds as i64),
            )
            .await?;

        self.spawn_email(
            user.email,
            user.display_name,
            OutboundEmail::PasswordReset { token: token.token },
        );

        Ok(())
    }

    /// Sets a new password using a reset token.
    ///
    /// The token is consumed only after the hash write succeeds, and every
    /// outstanding session for the user is invalidated so stolen cookies
    /// stop working immediately.
    pub async fn update_password(&self, request: UpdatePasswordRequest) -> ServiceResult<()> {
        if let Err(validation_errors) = request.validate() {
            return Err(ServiceError::from_validation(validation_errors));
        }

        check_password_policy(&request.new_password)?;

        let token_service = TokenService::new(self.pool);
        let token = token_service
            .validate(&request.token, TokenPurpose::ResetPassword)
            .await?;

        let password_hash = hash_password(&request.new_password)?;

        let user_repo = UserRepository::new(self.pool);
        if !user_repo
            .update_password_hash(&token.user_id, &password_hash)
            .await?
        {
            return Err(ServiceError::InvalidToken);
        }

        token_service.consume(&token.id).await?;

        let session_service = SessionService::new(self.pool, self.config);
        let cleared = session_service.invalidate_all(&token.user_id).await?;

        tracing::info!(
            "Password updated for user {}; {} session(s) invalidated",
            token.user_id,
            cleared
        );

        Ok(())
    }

    /// Hands an email to the dispatcher off the request path, with bounded
    /// retry and exponential backoff. Failures are logged only.
    fn spawn_email(&self, recipient: String, display_name: String, email: OutboundEmail) {
        let Some(mailer) = self.email_service.clone() else {
            tracing::warn!(
                "Email service not configured. Email not sent to {}",
                recipient
            );
            return;
        };

        tokio::spawn(async move {
            let mut delay = EMAIL_RETRY_BASE;

            for attempt in 1..=MAX_EMAIL_ATTEMPTS {
                let result = match &email {
                    OutboundEmail::Activation { token } => {
                        mailer
                            .send_activation_email(&recipient, &display_name, token)
                            .await
                    }
                    OutboundEmail::PasswordReset { token } => {
                        mailer
                            .send_password_reset_email(&recipient, &display_name, token)
                            .await
                    }
                };

                match result {
                    Ok(()) => {
                        tracing::info!("Email sent successfully to {}", recipient);
                        return;
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to send email to {} (attempt {}/{}): {}",
                            recipient,
                            attempt,
                            MAX_EMAIL_ATTEMPTS,
                            e
                        );
                    }
                }

                if attempt < MAX_EMAIL_ATTEMPTS {
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        });
    }
}

/// Maps a failed user INSERT to a service error. A UNIQUE constraint
/// violation means a concurrent registration won the race.
fn map_user_create_error(e: anyhow::Error, email: &str) -> ServiceError {
    if e.to_string().contains("UNIQUE constraint failed") {
        ServiceError::conflict("User with email", email)
    } else {
        ServiceError::Database { source: e }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use crate::repositories::user_repository::UserRepository;

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "Passw0rd!".to_string(),
            display_name: "Ahmad".to_string(),
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    /// Fetches the latest unconsumed token for a user straight from the
    /// store, standing in for reading the email.
    async fn latest_token(pool: &SqlitePool, user_id: &str, purpose: TokenPurpose) -> String {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT token FROM auth_tokens
            WHERE user_id = ? AND purpose = ? AND consumed = 0
            ORDER BY issued_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(purpose)
        .fetch_one(pool)
        .await
        .expect("expected an unconsumed token")
    }

    async fn token_count(pool: &SqlitePool, user_id: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM auth_tokens WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn registration_starts_pending_and_blocks_login() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let service = AuthService::new(&pool, &config);

        let user = service.register(register_request("a@x.com")).await.unwrap();
        assert_eq!(user.status, AccountStatus::Pending);
        assert_eq!(user.email, "a@x.com");

        assert!(matches!(
            service.login(login_request("a@x.com", "Passw0rd!")).await,
            Err(ServiceError::NotActivated)
        ));
    }

    #[tokio::test]
    async fn worked_example_full_lifecycle() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let service = AuthService::new(&pool, &config);

        let user = service.register(register_request("a@x.com")).await.unwrap();
        let t1 = latest_token(&pool, &user.id, TokenPurpose::Activate).await;

        let activated = service.activate(&t1).await.unwrap();
        assert_eq!(activated.status, AccountStatus::Active);

        // Single-use: the same token always fails the second time.
        assert!(matches!(
            service.activate(&t1).await,
            Err(ServiceError::InvalidToken)
        ));

        let (session, logged_in) = service
            .login(login_request("a@x.com", "Passw0rd!"))
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(session.user_id.as_deref(), Some(user.id.as_str()));
    }

    #[tokio::test]
    async fn registration_email_is_normalized() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let service = AuthService::new(&pool, &config);

        let user = service
            .register(register_request("MiXeD@Example.COM"))
            .await
            .unwrap();
        assert_eq!(user.email, "mixed@example.com");

        // Login works regardless of the case the caller types.
        let token = latest_token(&pool, &user.id, TokenPurpose::Activate).await;
        service.activate(&token).await.unwrap();
        assert!(
            service
                .login(login_request("mixed@EXAMPLE.com", "Passw0rd!"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let service = AuthService::new(&pool, &config);

        service.register(register_request("a@x.com")).await.unwrap();

        assert!(matches!(
            service.register(register_request("a@x.com")).await,
            Err(ServiceError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn losing_a_registration_race_is_a_conflict() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let service = AuthService::new(&pool, &config);

        service.register(register_request("a@x.com")).await.unwrap();

        // Drive the storage-layer constraint directly, as a request that
        // passed the advisory pre-check concurrently would.
        let repo = UserRepository::new(&pool);
        let error = repo
            .create_user(CreateUser {
                email: "a@x.com".to_string(),
                password_hash: "x".to_string(),
                display_name: "Racer".to_string(),
            })
            .await
            .expect_err("unique constraint should reject the duplicate");

        assert!(matches!(
            map_user_create_error(error, "a@x.com"),
            ServiceError::Conflict { .. }
        ));
    }

    #[tokio::test]
    async fn weak_passwords_are_rejected() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let service = AuthService::new(&pool, &config);

        let mut request = register_request("a@x.com");
        request.password = "short1".to_string();
        assert!(matches!(
            service.register(request).await,
            Err(ServiceError::Validation { .. })
        ));

        let mut request = register_request("a@x.com");
        request.password = "12345678".to_string();
        assert!(matches!(
            service.register(request).await,
            Err(ServiceError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn login_failures_are_generic() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let service = AuthService::new(&pool, &config);

        let user = service.register(register_request("a@x.com")).await.unwrap();
        let token = latest_token(&pool, &user.id, TokenPurpose::Activate).await;
        service.activate(&token).await.unwrap();

        // Unknown email and wrong password are indistinguishable.
        assert!(matches!(
            service.login(login_request("nobody@x.com", "Passw0rd!")).await,
            Err(ServiceError::Authentication)
        ));
        assert!(matches!(
            service.login(login_request("a@x.com", "WrongPass1")).await,
            Err(ServiceError::Authentication)
        ));
    }

    #[tokio::test]
    async fn resend_activation_invalidates_prior_token() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let service = AuthService::new(&pool, &config);

        let user = service.register(register_request("a@x.com")).await.unwrap();
        let first = latest_token(&pool, &user.id, TokenPurpose::Activate).await;

        service.resend_activation("a@x.com").await.unwrap();
        let second = latest_token(&pool, &user.id, TokenPurpose::Activate).await;

        assert_ne!(first, second);
        assert!(matches!(
            service.activate(&first).await,
            Err(ServiceError::InvalidToken)
        ));
        assert!(service.activate(&second).await.is_ok());
    }

    #[tokio::test]
    async fn resend_activation_is_enumeration_safe() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let service = AuthService::new(&pool, &config);

        assert!(service.resend_activation("ghost@x.com").await.is_ok());
    }

    #[tokio::test]
    async fn password_reset_request_is_enumeration_safe() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let service = AuthService::new(&pool, &config);

        let user = service.register(register_request("a@x.com")).await.unwrap();
        let token = latest_token(&pool, &user.id, TokenPurpose::Activate).await;
        service.activate(&token).await.unwrap();

        // Identical outcome for existing and unknown addresses.
        assert!(service.request_password_reset("a@x.com").await.is_ok());
        assert!(service.request_password_reset("ghost@x.com").await.is_ok());

        // But only the existing account got a token (activation + reset).
        assert_eq!(token_count(&pool, &user.id).await, 2);
    }

    #[tokio::test]
    async fn update_password_invalidates_all_sessions() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let service = AuthService::new(&pool, &config);
        let session_service = SessionService::new(&pool, &config);

        let user = service.register(register_request("a@x.com")).await.unwrap();
        let token = latest_token(&pool, &user.id, TokenPurpose::Activate).await;
        service.activate(&token).await.unwrap();

        let (first, _) = service
            .login(login_request("a@x.com", "Passw0rd!"))
            .await
            .unwrap();
        let (second, _) = service
            .login(login_request("a@x.com", "Passw0rd!"))
            .await
            .unwrap();

        service.request_password_reset("a@x.com").await.unwrap();
        let reset = latest_token(&pool, &user.id, TokenPurpose::ResetPassword).await;

        service
            .update_password(UpdatePasswordRequest {
                token: reset,
                new_password: "NewPassw0rd".to_string(),
            })
            .await
            .unwrap();

        // Previously issued sessions no longer authenticate.
        assert!(
            session_service
                .authenticate(&first.token)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            session_service
                .authenticate(&second.token)
                .await
                .unwrap()
                .is_none()
        );

        // Old password is dead, new one works.
        assert!(matches!(
            service.login(login_request("a@x.com", "Passw0rd!")).await,
            Err(ServiceError::Authentication)
        ));
        assert!(
            service
                .login(login_request("a@x.com", "NewPassw0rd"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn reset_token_is_single_use() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let service = AuthService::new(&pool, &config);

        let user = service.register(register_request("a@x.com")).await.unwrap();
        let token = latest_token(&pool, &user.id, TokenPurpose::Activate).await;
        service.activate(&token).await.unwrap();

        service.request_password_reset("a@x.com").await.unwrap();
        let reset = latest_token(&pool, &user.id, TokenPurpose::ResetPassword).await;

        service
            .update_password(UpdatePasswordRequest {
                token: reset.clone(),
                new_password: "NewPassw0rd".to_string(),
            })
            .await
            .unwrap();

        assert!(matches!(
            service
                .update_password(UpdatePasswordRequest {
                    token: reset,
                    new_password: "OtherPassw0rd1".to_string(),
                })
                .await,
            Err(ServiceError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn activation_token_cannot_reset_password() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let service = AuthService::new(&pool, &config);

        let user = service.register(register_request("a@x.com")).await.unwrap();
        let activation = latest_token(&pool, &user.id, TokenPurpose::Activate).await;

        assert!(matches!(
            service
                .update_password(UpdatePasswordRequest {
                    token: activation,
                    new_password: "NewPassw0rd".to_string(),
                })
                .await,
            Err(ServiceError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn logout_clears_the_session_and_never_fails() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let service = AuthService::new(&pool, &config);
        let session_service = SessionService::new(&pool, &config);

        let user = service.register(register_request("a@x.com")).await.unwrap();
        let token = latest_token(&pool, &user.id, TokenPurpose::Activate).await;
        service.activate(&token).await.unwrap();

        let (session, _) = service
            .login(login_request("a@x.com", "Passw0rd!"))
            .await
            .unwrap();

        service.logout(&session.token).await.unwrap();
        assert!(
            session_service
                .authenticate(&session.token)
                .await
                .unwrap()
                .is_none()
        );

        // Repeat logout and unknown tokens are still fine.
        service.logout(&session.token).await.unwrap();
        service.logout("never-issued").await.unwrap();
    }
}
