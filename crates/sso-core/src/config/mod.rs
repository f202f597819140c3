//! Configuration for sso-core
//!
//! Values come from an optional YAML file and are overridden by environment
//! variables prefixed with `SSO__`, using `__` between nested keys
//! (`SSO__TOKEN__TTL_SECONDS=900`). Every section has defaults, so an empty
//! configuration yields a working local setup.

use config::{Config, Environment as EnvSource, File};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::types::App;
use crate::{Error, Result};

/// Deployment environment, selects the log format and level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Dev,
    Prod,
}

/// Main configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SsoConfig {
    pub env: Environment,
    pub storage_path: String,
    pub token: TokenConfig,
    pub password: PasswordConfig,
    pub server: ServerConfig,
    /// Applications registered with the service at startup
    pub apps: Vec<AppConfig>,
}

/// Token issuance configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub ttl_seconds: u64,
    pub issuer: String,
    /// HS256, HS384 or HS512
    pub algorithm: String,
}

/// Password hashing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    /// Memory cost in KiB
    pub argon2_memory_cost: u32,
    pub argon2_time_cost: u32,
    pub argon2_parallelism: u32,
}

/// RPC listener configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub request_timeout_seconds: u64,
}

#[derive(Clone, Deserialize)]
pub struct AppConfig {
    pub id: i32,
    pub name: String,
    pub secret: String,
}

impl SsoConfig {
    /// Load from `path` (if any) and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "config file does not exist: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path));
        }

        let config: SsoConfig = builder
            .add_source(
                EnvSource::with_prefix("SSO")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| Error::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.storage_path.is_empty() {
            return Err(Error::Config("storage_path is required".to_string()));
        }
        if self.token.ttl_seconds == 0 {
            return Err(Error::Config("token.ttl_seconds must be positive".to_string()));
        }
        if self.server.request_timeout_seconds == 0 {
            return Err(Error::Config(
                "server.request_timeout_seconds must be positive".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for app in &self.apps {
            if app.id <= 0 {
                return Err(Error::Config(format!("app '{}' needs a positive id", app.name)));
            }
            if app.secret.is_empty() {
                return Err(Error::Config(format!("app {} has an empty secret", app.id)));
            }
            if !seen.insert(app.id) {
                return Err(Error::Config(format!("app id {} is configured twice", app.id)));
            }
        }

        Ok(())
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token.ttl_seconds)
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl AppConfig {
    pub fn to_app(&self) -> App {
        App {
            id: self.id,
            name: self.name.clone(),
            secret: self.secret.clone().into_bytes(),
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("secret", &"[redacted]")
            .finish()
    }
}

impl Default for SsoConfig {
    fn default() -> Self {
        Self {
            env: Environment::Local,
            storage_path: "./storage/sso.db".to_string(),
            token: TokenConfig::default(),
            password: PasswordConfig::default(),
            server: ServerConfig::default(),
            apps: Vec::new(),
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 3600,  // 1 hour
            issuer: "sso".to_string(),
            algorithm: "HS256".to_string(),
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost: 65536,
            argon2_time_cost: 3,
            argon2_parallelism: 4,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:44044".to_string(),
            request_timeout_seconds: 10,
        }
    }
}
