//! SQLite storage

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::Row;
use std::path::Path;

use super::{AppProvider, StorageError, StorageResult, UserProvider, UserSaver};
use crate::types::{App, User};

/// SQLite-based store for users and applications
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (creating if needed) the database file at `path` and apply the schema
    pub async fn new(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Other(format!("cannot create {}: {}", parent.display(), e)))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        // Run migrations
        let migration_sql = include_str!("../../migrations/001_initial_schema.sql");
        sqlx::raw_sql(migration_sql).execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Get the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Register an application, replacing name and secret if the ID exists
    pub async fn save_app(&self, app: &App) -> StorageResult<()> {
        sqlx::query(
            "INSERT INTO apps (id, name, secret) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, secret = excluded.secret"
        )
        .bind(app.id)
        .bind(&app.name)
        .bind(&app.secret)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn set_admin(&self, user_id: i64, is_admin: bool) -> StorageResult<()> {
        let result = sqlx::query("UPDATE users SET is_admin = ? WHERE id = ?")
            .bind(is_admin)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::UserNotFound);
        }

        Ok(())
    }

    fn row_to_user(row: SqliteRow) -> StorageResult<User> {
        Ok(User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            pass_hash: row.try_get("pass_hash")?,
        })
    }

    fn row_to_app(row: SqliteRow) -> StorageResult<App> {
        Ok(App {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            secret: row.try_get("secret")?,
        })
    }
}

#[async_trait]
impl UserSaver for SqliteStorage {
    async fn save_user(&self, email: &str, pass_hash: &[u8]) -> StorageResult<i64> {
        let result = sqlx::query("INSERT INTO users (email, pass_hash) VALUES (?, ?)")
            .bind(email)
            .bind(pass_hash)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => Ok(done.last_insert_rowid()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(StorageError::UserExists),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl UserProvider for SqliteStorage {
    async fn find_user_by_email(&self, email: &str) -> StorageResult<User> {
        let row = sqlx::query("SELECT id, email, pass_hash FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::UserNotFound)?;

        Self::row_to_user(row)
    }

    async fn is_admin(&self, user_id: i64) -> StorageResult<bool> {
        let row = sqlx::query("SELECT is_admin FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::UserNotFound)?;

        Ok(row.try_get("is_admin")?)
    }
}

#[async_trait]
impl AppProvider for SqliteStorage {
    async fn find_app_by_id(&self, app_id: i32) -> StorageResult<App> {
        let row = sqlx::query("SELECT id, name, secret FROM apps WHERE id = ?")
            .bind(app_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::AppNotFound)?;

        Self::row_to_app(row)
    }
}
