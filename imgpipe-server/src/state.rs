//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::auth::{CredentialVerifier, JwtConfig};
use crate::service::JobService;
use crate::storage::{ObjectStore, UrlSigner};

#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<JobService>,
    pub objects: Arc<dyn ObjectStore>,
    /// Verifies the grants carried by pre-signed object URLs
    pub signer: Arc<UrlSigner>,
    pub credentials: Arc<dyn CredentialVerifier>,
    pub jwt: Arc<JwtConfig>,
    pub max_upload_bytes: usize,
}
