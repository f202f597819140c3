//! Authentication service
//!
//! Orchestrates the credential hasher, the storage contracts and the token
//! issuer. The service holds no mutable state: one instance is built at
//! startup and shared as `Arc<AuthService>` by every request task.
//!
//! Every failure is logged once, here, where it is classified. Log events
//! carry the operation name and the email or user ID, never password
//! material.

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::hasher::CredentialHasher;
use crate::jwt::TokenIssuer;
use crate::storage::{AppProvider, StorageError, UserProvider, UserSaver};
use crate::{Error, Result};

/// Plaintext for the digest that unknown emails are verified against
const DUMMY_PASSWORD: &str = "sso-dummy-password-for-unknown-accounts";

/// Authentication service
pub struct AuthService {
    user_saver: Arc<dyn UserSaver>,
    user_provider: Arc<dyn UserProvider>,
    app_provider: Arc<dyn AppProvider>,
    hasher: CredentialHasher,
    issuer: TokenIssuer,
    token_ttl: Duration,
    /// Verified when the email is unknown, so both failure paths cost one verification
    dummy_digest: Vec<u8>,
}

impl AuthService {
    pub fn new(
        user_saver: Arc<dyn UserSaver>,
        user_provider: Arc<dyn UserProvider>,
        app_provider: Arc<dyn AppProvider>,
        hasher: CredentialHasher,
        issuer: TokenIssuer,
        token_ttl: Duration,
    ) -> Result<Self> {
        if token_ttl.is_zero() {
            return Err(Error::Config("token TTL must be positive".to_string()));
        }

        let dummy_digest = hasher
            .hash(DUMMY_PASSWORD)
            .map_err(|e| Error::Config(format!("Failed to prepare password hasher: {}", e)))?;

        Ok(Self {
            user_saver,
            user_provider,
            app_provider,
            hasher,
            issuer,
            token_ttl,
            dummy_digest,
        })
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    pub fn token_issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Check credentials and issue a token for `app_id`.
    ///
    /// Unknown email and wrong password both fail with
    /// [`Error::InvalidCredentials`]. An unknown application fails with
    /// [`Error::UnknownApplication`], and only after the credentials checked out.
    pub async fn login(&self, email: &str, password: &str, app_id: i32) -> Result<String> {
        const OP: &str = "auth.login";

        if email.is_empty() {
            return Err(Error::invalid_argument("email is required"));
        }
        if password.is_empty() {
            return Err(Error::invalid_argument("password is required"));
        }
        if app_id == 0 {
            return Err(Error::invalid_argument("app_id is required"));
        }

        info!(op = OP, email, app_id, "attempting to login user");

        let user = match self.user_provider.find_user_by_email(email).await {
            Ok(user) => user,
            Err(StorageError::UserNotFound) => {
                // Outcome is discarded; only the cost matters.
                let _ = self
                    .hasher
                    .spawn_verify(password.to_string(), self.dummy_digest.clone())
                    .await;
                warn!(op = OP, email, "user not found");
                return Err(Error::InvalidCredentials);
            }
            Err(e) => {
                error!(op = OP, email, error = %e, "failed to get user");
                return Err(Error::internal(OP, e));
            }
        };

        match self
            .hasher
            .spawn_verify(password.to_string(), user.pass_hash.clone())
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                warn!(op = OP, email, user_id = user.id, "invalid password");
                return Err(Error::InvalidCredentials);
            }
            Err(e) => {
                error!(op = OP, email, user_id = user.id, error = %e, "failed to verify password");
                return Err(Error::internal(OP, e));
            }
        }

        let app = match self.app_provider.find_app_by_id(app_id).await {
            Ok(app) => app,
            Err(StorageError::AppNotFound) => {
                warn!(op = OP, email, app_id, "app not found");
                return Err(Error::UnknownApplication(app_id));
            }
            Err(e) => {
                error!(op = OP, email, app_id, error = %e, "failed to get app");
                return Err(Error::internal(OP, e));
            }
        };

        let token = self.issuer.issue(&user, &app, self.token_ttl).map_err(|e| {
            error!(op = OP, email, app_id, error = %e, "failed to generate token");
            Error::internal(OP, e)
        })?;

        info!(op = OP, email, user_id = user.id, app_id = app.id, "user logged in successfully");
        Ok(token)
    }

    /// Hash the password and store a new user, returning its ID.
    ///
    /// No token is issued. The user becomes visible to [`login`](Self::login)
    /// only once storage has accepted the complete record.
    pub async fn register_new_user(&self, email: &str, password: &str) -> Result<i64> {
        const OP: &str = "auth.register_new_user";

        if email.is_empty() {
            return Err(Error::invalid_argument("email is required"));
        }
        if password.is_empty() {
            return Err(Error::invalid_argument("password is required"));
        }

        info!(op = OP, email, "registering user");

        let pass_hash = self
            .hasher
            .spawn_hash(password.to_string())
            .await
            .map_err(|e| {
                error!(op = OP, email, error = %e, "failed to hash password");
                Error::internal(OP, e)
            })?;

        let user_id = match self.user_saver.save_user(email, &pass_hash).await {
            Ok(id) => id,
            Err(StorageError::UserExists) => {
                warn!(op = OP, email, "user already exists");
                return Err(Error::UserAlreadyExists);
            }
            Err(e) => {
                error!(op = OP, email, error = %e, "failed to save user");
                return Err(Error::internal(OP, e));
            }
        };

        info!(op = OP, email, user_id, "user registered");
        Ok(user_id)
    }

    /// Whether `user_id` holds administrative privileges.
    ///
    /// A user that does not exist is a lookup failure like any other.
    pub async fn is_admin(&self, user_id: i64) -> Result<bool> {
        const OP: &str = "auth.is_admin";

        if user_id == 0 {
            return Err(Error::invalid_argument("user_id is required"));
        }

        info!(op = OP, user_id, "checking if user is admin");

        let is_admin = self.user_provider.is_admin(user_id).await.map_err(|e| {
            error!(op = OP, user_id, error = %e, "failed to check admin flag");
            Error::internal(OP, e)
        })?;

        info!(op = OP, user_id, is_admin, "checked if user is admin");
        Ok(is_admin)
    }
}
