//! Error types for sso-core
//!
//! Storage, hashing and signing failures are translated into this taxonomy at
//! the [`AuthService`](crate::AuthService) boundary. Callers only ever see the
//! kind; the boxed cause inside [`Error::Internal`] is for server-side logs.

use thiserror::Error;

/// Boxed cause carried by [`Error::Internal`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    /// Unknown email or wrong password. The two are deliberately merged.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("unknown application: {0}")]
    UnknownApplication(i32),

    #[error("user already exists")]
    UserAlreadyExists,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{op}: {source}")]
    Internal {
        op: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Wrap an unclassified failure of operation `op`
    pub fn internal(op: &'static str, source: impl Into<BoxError>) -> Self {
        Error::Internal {
            op,
            source: source.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    /// Stable machine-readable code, also used on the wire
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidCredentials => "INVALID_CREDENTIALS",
            Error::UnknownApplication(_) => "UNKNOWN_APPLICATION",
            Error::UserAlreadyExists => "USER_ALREADY_EXISTS",
            Error::InvalidArgument(_) => "INVALID_ARGUMENT",
            Error::Internal { .. } | Error::Config(_) => "INTERNAL",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
