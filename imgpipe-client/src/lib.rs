//! imgpipe HTTP Client
//!
//! A small, type-safe HTTP client for the imgpipe server API, used by the
//! CLI.
//!
//! # Example
//!
//! ```no_run
//! use imgpipe_client::ImgpipeClient;
//! use imgpipe_core::domain::step::Step;
//! use imgpipe_core::dto::job::CreateJob;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut client = ImgpipeClient::new("http://localhost:8080");
//!     let token = client.login("alice", "password1").await?;
//!     client.set_token(token);
//!
//!     let submitted = client
//!         .submit_job(CreateJob {
//!             source_id: None,
//!             ops: vec![Step::Blur { sigma: 2.0 }],
//!         })
//!         .await?;
//!
//!     println!("Submitted job: {}", submitted.id());
//!     Ok(())
//! }
//! ```

pub mod error;
mod auth;
mod jobs;
mod objects;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// HTTP client for the imgpipe server API
///
/// Methods are grouped by concern:
/// - Authentication (login)
/// - Jobs (submit, process, get, list, fetch output)
/// - Pre-signed object transfer (upload, download)
#[derive(Debug, Clone)]
pub struct ImgpipeClient {
    /// Base URL of the server (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
    /// Bearer token sent to protected endpoints
    token: Option<String>,
}

impl ImgpipeClient {
    /// Create a new client
    ///
    /// # Example
    /// ```
    /// use imgpipe_client::ImgpipeClient;
    ///
    /// let client = ImgpipeClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            token: None,
        }
    }

    /// Builder-style variant of [`ImgpipeClient::set_token`]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.set_token(token);
        self
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer token, failing early when there is none
    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.token.as_deref().ok_or(ClientError::MissingToken)?;
        Ok(request.bearer_auth(token))
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Turn a non-success response into a [`ClientError`]
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ClientError::from_body(status.as_u16(), &body))
    }

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response whose body is raw bytes
    async fn handle_bytes(response: reqwest::Response) -> Result<Vec<u8>> {
        let bytes = Self::check_status(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// Handle an API response that returns no content
    async fn handle_empty_response(response: reqwest::Response) -> Result<()> {
        Self::check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ImgpipeClient::new("http://localhost:8080");
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert!(client.token().is_none());
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = ImgpipeClient::new("http://localhost:8080/");
        assert_eq!(client.url("/v1/jobs"), "http://localhost:8080/v1/jobs");
    }

    #[test]
    fn test_client_with_token() {
        let client = ImgpipeClient::with_client("http://localhost:8080", Client::new())
            .with_token("abc");
        assert_eq!(client.token(), Some("abc"));
    }

    #[test]
    fn test_protected_call_without_token() {
        let client = ImgpipeClient::new("http://localhost:8080");
        let request = client.client.get(client.url("/v1/jobs"));
        assert!(matches!(
            client.authorized(request),
            Err(ClientError::MissingToken)
        ));
    }
}
