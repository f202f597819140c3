//! In-memory storage

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use super::{AppProvider, StorageError, StorageResult, UserProvider, UserSaver};
use crate::types::{App, User};

/// DashMap-backed store implementing every storage contract
pub struct MemoryStorage {
    /// Map of email to user
    users: DashMap<String, User>,
    /// Map of user_id to admin flag
    admins: DashMap<i64, bool>,
    apps: DashMap<i32, App>,
    next_user_id: AtomicI64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_first_user_id(1)
    }

    /// Start assigning user IDs at `first_id`
    pub fn with_first_user_id(first_id: i64) -> Self {
        Self {
            users: DashMap::new(),
            admins: DashMap::new(),
            apps: DashMap::new(),
            next_user_id: AtomicI64::new(first_id),
        }
    }

    /// Register or replace an application
    pub fn save_app(&self, app: App) {
        self.apps.insert(app.id, app);
    }

    pub fn set_admin(&self, user_id: i64, is_admin: bool) -> StorageResult<()> {
        match self.admins.get_mut(&user_id) {
            Some(mut flag) => {
                *flag = is_admin;
                Ok(())
            }
            None => Err(StorageError::UserNotFound),
        }
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserSaver for MemoryStorage {
    async fn save_user(&self, email: &str, pass_hash: &[u8]) -> StorageResult<i64> {
        // The entry guard holds the shard lock, so the uniqueness check and
        // the insert are atomic.
        match self.users.entry(email.to_string()) {
            Entry::Occupied(_) => Err(StorageError::UserExists),
            Entry::Vacant(slot) => {
                let id = self.next_user_id.fetch_add(1, Ordering::SeqCst);
                self.admins.insert(id, false);
                slot.insert(User {
                    id,
                    email: email.to_string(),
                    pass_hash: pass_hash.to_vec(),
                });
                Ok(id)
            }
        }
    }
}

#[async_trait]
impl UserProvider for MemoryStorage {
    async fn find_user_by_email(&self, email: &str) -> StorageResult<User> {
        self.users
            .get(email)
            .map(|entry| entry.clone())
            .ok_or(StorageError::UserNotFound)
    }

    async fn is_admin(&self, user_id: i64) -> StorageResult<bool> {
        self.admins
            .get(&user_id)
            .map(|flag| *flag)
            .ok_or(StorageError::UserNotFound)
    }
}

#[async_trait]
impl AppProvider for MemoryStorage {
    async fn find_app_by_id(&self, app_id: i32) -> StorageResult<App> {
        self.apps
            .get(&app_id)
            .map(|entry| entry.clone())
            .ok_or(StorageError::AppNotFound)
    }
}
