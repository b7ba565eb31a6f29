//! Credential verification.
//!
//! Login is delegated to a [`CredentialVerifier`]; the server only sees the
//! resulting [`Principal`]. [`StaticCredentials`] is the bundled backing: a
//! fixed user list read from configuration.

use async_trait::async_trait;
use thiserror::Error;

/// An authenticated identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Owner id that jobs are filed under
    pub id: String,
    pub username: String,
    pub role: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("malformed user entry {0:?}, expected user:password[:role]")]
    MalformedEntry(String),

    #[error("username {0:?} may only contain letters, digits, '-', '_' and '.'")]
    InvalidUsername(String),

    #[error("duplicate user {0:?}")]
    Duplicate(String),

    #[error("no users configured")]
    Empty,
}

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Check a username/password pair. `None` means "reject".
    async fn verify(&self, username: &str, password: &str) -> Option<Principal>;
}

#[derive(Debug, Clone)]
struct StaticUser {
    username: String,
    password: String,
    role: String,
}

/// Fixed user list
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    users: Vec<StaticUser>,
}

impl StaticCredentials {
    /// Parse `user:password[:role]` entries separated by commas.
    ///
    /// Usernames become owner ids and appear in object keys, so they are
    /// restricted to URL-safe characters.
    pub fn parse(spec: &str) -> Result<Self, CredentialError> {
        let mut users: Vec<StaticUser> = Vec::new();

        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let mut parts = entry.splitn(3, ':');
            let (username, password) = match (parts.next(), parts.next()) {
                (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
                _ => return Err(CredentialError::MalformedEntry(entry.to_string())),
            };
            let role = parts.next().filter(|r| !r.is_empty()).unwrap_or("user");

            let valid = username
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
            if !valid || username == "." || username == ".." {
                return Err(CredentialError::InvalidUsername(username.to_string()));
            }
            if users.iter().any(|u| u.username == username) {
                return Err(CredentialError::Duplicate(username.to_string()));
            }

            users.push(StaticUser {
                username: username.to_string(),
                password: password.to_string(),
                role: role.to_string(),
            });
        }

        if users.is_empty() {
            return Err(CredentialError::Empty);
        }

        Ok(Self { users })
    }

    /// The two local development accounts
    pub fn development() -> Self {
        Self {
            users: vec![
                StaticUser {
                    username: "admin".to_string(),
                    password: "admin123!".to_string(),
                    role: "admin".to_string(),
                },
                StaticUser {
                    username: "alice".to_string(),
                    password: "password1".to_string(),
                    role: "user".to_string(),
                },
            ],
        }
    }

    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.users.iter().map(|u| u.username.as_str())
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentials {
    async fn verify(&self, username: &str, password: &str) -> Option<Principal> {
        self.users
            .iter()
            .find(|u| u.username == username && u.password == password)
            .map(|u| Principal {
                id: u.username.clone(),
                username: u.username.clone(),
                role: u.role.clone(),
            })
    }
}
