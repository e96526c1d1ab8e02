//! Bearer-token authentication for realtime sessions.
//!
//! The session handshake resolves a token to a `UserId` exactly once,
//! through the [`Authenticator`] trait. The production implementation
//! validates HS256 JWTs whose subject is the integer user id; tests
//! substitute their own implementations.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::identifiers::UserId;

/// Claims carried by Focus access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id, as a decimal string.
    pub sub: String,
    /// Expiration time (unix timestamp).
    pub exp: usize,
    /// Issued-at time (unix timestamp).
    pub iat: usize,
}

impl Claims {
    pub fn new(user_id: UserId, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid or expired token")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("token subject is not a user id: {0}")]
    InvalidSubject(String),
}

/// Resolves a bearer credential to the user behind it.
///
/// Called exactly once per connection, before any registry entry is
/// created; a failure closes the socket.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<UserId, AuthError>;
}

/// HS256 JWT authenticator sharing the secret with the account service.
pub struct JwtAuthenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtAuthenticator {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a signed access token. The server itself never mints
    /// tokens for clients; this exists for tooling and tests.
    pub fn issue_token(&self, user_id: UserId, ttl: Duration) -> Result<String, AuthError> {
        let claims = Claims::new(user_id, ttl);
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn decode_token(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims)
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<UserId, AuthError> {
        let claims = self.decode_token(token)?;
        claims
            .sub
            .parse()
            .map_err(|_| AuthError::InvalidSubject(claims.sub.clone()))
    }
}
