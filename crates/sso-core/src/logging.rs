//! Logging setup

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::Environment;
use crate::{Error, Result};

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level used when `RUST_LOG` is not set
    pub level: Level,
    /// Whether to enable JSON formatting
    pub json: bool,
}

impl LoggingConfig {
    /// `local` logs human-readable at debug, `dev` JSON at debug, `prod` JSON at info
    pub fn for_env(env: Environment) -> Self {
        match env {
            Environment::Local => LoggingConfig { level: Level::DEBUG, json: false },
            Environment::Dev => LoggingConfig { level: Level::DEBUG, json: true },
            Environment::Prod => LoggingConfig { level: Level::INFO, json: true },
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_str().to_lowercase()))
    }
}

/// Install the global subscriber for `env`
pub fn setup_logging(env: Environment) -> Result<()> {
    let config = LoggingConfig::for_env(env);
    let builder = tracing_subscriber::fmt().with_env_filter(config.filter());

    let installed = if config.json {
        builder.json().with_writer(std::io::stdout).try_init()
    } else {
        builder.with_target(false).try_init()
    };

    installed.map_err(|e| Error::Config(format!("Failed to install logger: {}", e)))
}
