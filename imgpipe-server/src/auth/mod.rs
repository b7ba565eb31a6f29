//! Authentication
//!
//! Callers log in with a username and password and receive a bearer token.
//! Protected handlers take an [`AuthUser`] argument, which rejects requests
//! without a valid token.

pub mod credentials;
pub mod extractor;
pub mod jwt;

pub use credentials::{CredentialError, CredentialVerifier, Principal, StaticCredentials};
pub use extractor::AuthUser;
pub use jwt::{Claims, JwtConfig, generate_access_token, validate_token};
