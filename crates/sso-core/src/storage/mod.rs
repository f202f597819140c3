//! Storage contracts consumed by the authentication service
//!
//! Each capability is its own trait so the service can be wired to different
//! backends per concern, and tests can fake one contract at a time.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{App, User};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("user not found")]
    UserNotFound,

    #[error("app not found")]
    AppNotFound,

    #[error("user already exists")]
    UserExists,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Other(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Persists new users
#[async_trait]
pub trait UserSaver: Send + Sync {
    /// Store a user and return its newly assigned ID.
    /// Fails with [`StorageError::UserExists`] when the email is taken.
    async fn save_user(&self, email: &str, pass_hash: &[u8]) -> StorageResult<i64>;
}

/// Reads users
#[async_trait]
pub trait UserProvider: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> StorageResult<User>;
    async fn is_admin(&self, user_id: i64) -> StorageResult<bool>;
}

/// Reads applications
#[async_trait]
pub trait AppProvider: Send + Sync {
    async fn find_app_by_id(&self, app_id: i32) -> StorageResult<App>;
}
