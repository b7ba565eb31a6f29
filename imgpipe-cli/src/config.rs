//! Configuration module
//!
//! Handles CLI configuration including the server URL and bearer token.

use anyhow::Result;
use imgpipe_client::{ClientError, ImgpipeClient};

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the imgpipe server
    pub server_url: String,

    /// Bearer token, if the caller has logged in
    pub token: Option<String>,
}

impl Config {
    /// Client without credentials
    pub fn client(&self) -> ImgpipeClient {
        ImgpipeClient::new(&self.server_url)
    }

    /// Client for protected endpoints; fails when no token is configured
    pub fn authorized_client(&self) -> Result<ImgpipeClient> {
        let token = self.token.as_deref().ok_or_else(|| {
            anyhow::Error::new(ClientError::MissingToken)
                .context("Run `imgpipe login` and export IMGPIPE_TOKEN, or pass --token")
        })?;

        Ok(self.client().with_token(token))
    }
}
