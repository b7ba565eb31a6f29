//! Pre-signed object URLs.
//!
//! A pre-signed URL embeds an HS256 JWT "grant" naming one object key, one
//! access mode and an expiry. Holding the URL is the only credential needed
//! to read or write that object until the grant expires.

use std::time::Duration;

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Audience that keeps object grants and bearer tokens apart
const GRANT_AUDIENCE: &str = "imgpipe-objects";

/// What a grant allows its holder to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectAccess {
    Read,
    Write,
}

#[derive(Debug, Serialize, Deserialize)]
struct Grant {
    key: String,
    access: ObjectAccess,
    aud: String,
    exp: i64,
    iat: i64,
}

/// Reasons a grant is refused
#[derive(Debug, Error)]
pub enum GrantError {
    #[error("missing object grant")]
    Missing,

    #[error("invalid or expired object grant: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("grant is for a different object")]
    WrongKey,

    #[error("grant does not allow {0:?} access")]
    WrongAccess(ObjectAccess),
}

/// Issues and checks pre-signed object URLs
#[derive(Clone)]
pub struct UrlSigner {
    secret: String,
    public_url: String,
    ttl: Duration,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("public_url", &self.public_url)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl UrlSigner {
    /// # Arguments
    /// * `secret` - HMAC secret for grants
    /// * `public_url` - Base URL clients reach this server at
    /// * `ttl` - Lifetime of every issued URL
    pub fn new(secret: impl Into<String>, public_url: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Build a pre-signed URL for `key`
    pub fn sign(&self, key: &str, access: ObjectAccess) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now().timestamp();
        let grant = Grant {
            key: key.to_string(),
            access,
            aud: GRANT_AUDIENCE.to_string(),
            exp: now + self.ttl.as_secs() as i64,
            iat: now,
        };

        let token = encode(
            &Header::default(),
            &grant,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;

        Ok(format!("{}/v1/objects/{}?token={}", self.public_url, key, token))
    }

    /// Check that `token` grants `access` to `key`
    pub fn verify(&self, token: &str, key: &str, access: ObjectAccess) -> Result<(), GrantError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_audience(&[GRANT_AUDIENCE]);

        let grant = decode::<Grant>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )?
        .claims;

        if grant.key != key {
            return Err(GrantError::WrongKey);
        }
        if grant.access != access {
            return Err(GrantError::WrongAccess(access));
        }

        Ok(())
    }
}
