//! # SSO-Core
//!
//! Single sign-on authentication service.
//!
//! This crate provides:
//! - Password registration and verification with Argon2id
//! - Access tokens signed per application with that application's secret
//! - Administrative-privilege lookups
//! - Storage contracts with SQLite and in-memory backends
//! - A JSON RPC transport built on axum
//!
//! ## Architecture
//!
//! The [`AuthService`] is the only place with policy: which failures are
//! reported as invalid credentials, which as unknown applications, and which
//! collapse into an opaque internal error. Storage, hashing and signing are
//! collaborators it is handed at construction.

pub mod error;
pub mod types;
pub mod hasher;
pub mod jwt;
pub mod storage;
pub mod auth;
pub mod api;
pub mod config;
pub mod logging;

use std::sync::Arc;
use tracing::info;

pub use error::{Error, Result};
pub use types::{App, User};
pub use auth::AuthService;
pub use hasher::{CredentialHasher, HashError};
pub use jwt::{TokenClaims, TokenError, TokenIssuer};
pub use storage::{AppProvider, MemoryStorage, SqliteStorage, StorageError, UserProvider, UserSaver};
pub use config::SsoConfig;

/// Initialize the sso-core service on SQLite storage
pub async fn init(config: &SsoConfig) -> Result<AuthService> {
    config.validate()?;

    // Initialize database
    let storage = SqliteStorage::new(&config.storage_path)
        .await
        .map_err(|e| Error::Config(format!("Failed to open storage: {}", e)))?;

    for app in &config.apps {
        storage
            .save_app(&app.to_app())
            .await
            .map_err(|e| Error::Config(format!("Failed to register app {}: {}", app.id, e)))?;
        info!(app_id = app.id, app_name = %app.name, "application registered");
    }

    let storage = Arc::new(storage);
    let hasher = CredentialHasher::new(&config.password)?;
    let issuer = TokenIssuer::new(&config.token)?;

    AuthService::new(
        storage.clone(),
        storage.clone(),
        storage,
        hasher,
        issuer,
        config.token_ttl(),
    )
}
