//! Object Storage Module
//!
//! Byte storage for job inputs and outputs, keyed by opaque strings.
//! Stores also hand out time-limited pre-signed URLs; those URLs point back
//! at this server's `/v1/objects/{*key}` routes and carry a signed grant.

pub mod fs;
pub mod memory;
pub mod signing;

pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;
pub use signing::{GrantError, ObjectAccess, UrlSigner};

use async_trait::async_trait;
use thiserror::Error;

/// Storage error type
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid object key: {0:?}")]
    InvalidKey(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to sign object URL: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Key-addressed byte storage with pre-signed URL issuance
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read a whole object
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Create or replace an object
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError>;

    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// URL the holder may PUT the object's bytes to until it expires
    fn presign_upload(&self, key: &str) -> Result<String, StorageError>;

    /// URL the holder may GET the object from until it expires
    fn presign_download(&self, key: &str) -> Result<String, StorageError>;
}

/// Check that a key is a relative path of safe segments.
///
/// Keys end up both in file paths and in URLs, so only unreserved URL
/// characters are accepted and `.`/`..` segments are refused.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid_char = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');
    let valid = !key.is_empty()
        && key.split('/').all(|segment| {
            !segment.is_empty()
                && segment != "."
                && segment != ".."
                && segment.chars().all(valid_char)
        });

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// Content type served for a key, from its extension
pub fn content_type_for(key: &str) -> &'static str {
    match key.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ext) if ext == "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_accepts_job_keys() {
        assert!(validate_key("seed/seed.png").is_ok());
        assert!(validate_key("users/alice/jobs/0b7e/input").is_ok());
    }

    #[test]
    fn test_validate_key_rejects_traversal() {
        for key in [
            "",
            "/etc/passwd",
            "users/../secret",
            "users/./x",
            "users//x",
            "users/a b",
            "users\\x",
            "users/x/",
        ] {
            assert!(validate_key(key).is_err(), "{key:?} should be rejected");
        }
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("users/a/jobs/1/output.png"), "image/png");
        assert_eq!(content_type_for("x/photo.JPG"), "image/jpeg");
        assert_eq!(content_type_for("users/a/jobs/1/input"), "application/octet-stream");
    }
}
