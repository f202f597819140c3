//! JWT token issuance
//!
//! Tokens are HMAC-signed with the secret of the application they are issued
//! for, so each application can only validate tokens addressed to it.

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::TokenConfig;
use crate::types::{App, User};
use crate::{Error, Result};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("application {0} has no signing secret")]
    EmptySecret(i32),

    #[error("token encoding failed: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub uid: i64,                 // User ID
    pub email: String,
    pub app_id: i32,
    pub iat: i64,                 // Issued at
    pub exp: i64,                 // Expiration
    pub iss: String,              // Issuer
}

/// Signs access tokens for users of registered applications
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    issuer: String,
    header: Header,
}

impl TokenIssuer {
    pub fn new(config: &TokenConfig) -> Result<Self> {
        let algorithm = match config.algorithm.as_str() {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            other => return Err(Error::Config(format!("Unsupported algorithm: {}", other))),
        };

        Ok(Self {
            issuer: config.issuer.clone(),
            header: Header::new(algorithm),
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.header.alg
    }

    /// Issue a token for `user` at `app` that expires `ttl` from now
    pub fn issue(&self, user: &User, app: &App, ttl: Duration) -> std::result::Result<String, TokenError> {
        self.issue_at(user, app, ttl, Utc::now())
    }

    /// Same as [`issue`](Self::issue) with an explicit clock reading
    pub fn issue_at(
        &self,
        user: &User,
        app: &App,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> std::result::Result<String, TokenError> {
        if app.secret.is_empty() {
            return Err(TokenError::EmptySecret(app.id));
        }

        let claims = self.claims_at(user, app, ttl, now);
        let token = encode(&self.header, &claims, &EncodingKey::from_secret(&app.secret))?;
        Ok(token)
    }

    /// Claim set for a token issued at `now`; whole seconds, `exp = iat + ttl`
    pub fn claims_at(&self, user: &User, app: &App, ttl: Duration, now: DateTime<Utc>) -> TokenClaims {
        let iat = now.timestamp();
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);

        TokenClaims {
            uid: user.id,
            email: user.email.clone(),
            app_id: app.id,
            iat,
            exp: iat.saturating_add(ttl),
            iss: self.issuer.clone(),
        }
    }
}
