//! Credential hashing with Argon2id
//!
//! Digests are PHC strings stored as bytes, so the algorithm, version and cost
//! parameters travel with each digest. Verification always uses the
//! parameters embedded in the digest, which lets the configured cost change
//! without invalidating existing accounts.

use argon2::{Algorithm, Argon2, Params, Version};
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use thiserror::Error;

use crate::config::PasswordConfig;
use crate::{Error, Result};

#[derive(Debug, Error)]
pub enum HashError {
    /// Stored digest does not parse; points at data corruption, not a bad password
    #[error("malformed password hash: {0}")]
    Malformed(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Argon2id password hasher with a fixed, versioned cost
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    pub fn new(config: &PasswordConfig) -> Result<Self> {
        let params = Params::new(
            config.argon2_memory_cost,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| Error::Config(format!("Invalid argon2 parameters: {}", e)))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash `password` with a freshly generated salt
    pub fn hash(&self, password: &str) -> std::result::Result<Vec<u8>, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| HashError::Hashing(e.to_string()))?;

        Ok(hash.to_string().into_bytes())
    }

    /// Check `password` against `digest`.
    ///
    /// A mismatch is `Ok(false)`. Only a digest that cannot be parsed or
    /// evaluated is an error.
    pub fn verify(&self, password: &str, digest: &[u8]) -> std::result::Result<bool, HashError> {
        let encoded = std::str::from_utf8(digest)
            .map_err(|_| HashError::Malformed("digest is not valid UTF-8".to_string()))?;
        let parsed = PasswordHash::new(encoded).map_err(|e| HashError::Malformed(e.to_string()))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashError::Malformed(e.to_string())),
        }
    }

    /// [`hash`](Self::hash) on the blocking pool
    pub async fn spawn_hash(&self, password: String) -> std::result::Result<Vec<u8>, HashError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password)).await?
    }

    /// [`verify`](Self::verify) on the blocking pool
    pub async fn spawn_verify(
        &self,
        password: String,
        digest: Vec<u8>,
    ) -> std::result::Result<bool, HashError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &digest)).await?
    }
}
