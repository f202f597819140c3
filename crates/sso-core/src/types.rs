//! Core types for sso-core

use serde::Serialize;
use std::fmt;

/// User account as held by storage
#[derive(Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// PHC-encoded Argon2 digest, produced only by the credential hasher
    #[serde(skip_serializing)]
    pub pass_hash: Vec<u8>,
}

/// Application that requests tokens for its users
#[derive(Clone, Serialize)]
pub struct App {
    pub id: i32,
    pub name: String,
    /// HMAC signing secret for this application's tokens
    #[serde(skip_serializing)]
    pub secret: Vec<u8>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("pass_hash", &"[redacted]")
            .finish()
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("secret", &"[redacted]")
            .finish()
    }
}
