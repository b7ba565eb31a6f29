//! Transfers through pre-signed URLs
//!
//! These URLs carry their own grant, so no bearer token is sent.

use crate::ImgpipeClient;
use crate::error::Result;

impl ImgpipeClient {
    /// PUT `bytes` to a pre-signed upload URL
    pub async fn upload(&self, url: &str, bytes: Vec<u8>) -> Result<()> {
        tracing::debug!("Uploading {} bytes", bytes.len());
        let response = self.client.put(url).body(bytes).send().await?;

        Self::handle_empty_response(response).await
    }

    /// GET the object behind a pre-signed download URL
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        Self::handle_bytes(response).await
    }
}
