//! Login API Handler

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use imgpipe_core::dto::auth::{LoginRequest, LoginResponse};

use crate::api::error::{ApiError, ApiResult};
use crate::auth::generate_access_token;
use crate::state::AppState;

/// POST /v1/auth/login
/// Exchange a username and password for a bearer token
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(req) = payload?;

    let principal = state
        .credentials
        .verify(&req.username, &req.password)
        .await
        .ok_or_else(|| {
            tracing::info!("Rejected login for {:?}", req.username);
            ApiError::BadCredentials
        })?;

    let token = generate_access_token(&principal, &state.jwt)
        .map_err(|e| ApiError::InternalError(format!("failed to issue token: {}", e)))?;

    tracing::info!("Issued token for {}", principal.username);
    Ok(Json(LoginResponse { token }))
}
