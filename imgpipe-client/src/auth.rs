//! Authentication endpoint

use imgpipe_core::dto::auth::{LoginRequest, LoginResponse};

use crate::ImgpipeClient;
use crate::error::Result;

impl ImgpipeClient {
    /// Exchange credentials for a bearer token
    ///
    /// The token is returned, not stored; pass it to
    /// [`ImgpipeClient::set_token`] to use it.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let response = self
            .client
            .post(self.url("/v1/auth/login"))
            .json(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        let login: LoginResponse = Self::handle_response(response).await?;
        Ok(login.token)
    }
}
