//! Bearer token extractor for axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::jwt::validate_token;
use crate::api::error::ApiError;
use crate::state::AppState;

/// Caller identity taken from the `Authorization: Bearer <token>` header.
///
/// ```ignore
/// async fn handler(user: AuthUser) -> ApiResult<Json<()>> {
///     tracing::info!(owner = %user.owner_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Owner id jobs are filed under (`claims.sub`)
    pub owner_id: String,
    pub username: String,
    pub role: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthenticated("Missing Authorization header".into()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::Unauthenticated("Invalid Authorization format. Expected: Bearer <token>".into())
        })?;

        let claims = validate_token(token.trim(), &state.jwt)
            .map_err(|_| ApiError::InvalidToken("Invalid or expired token".into()))?;

        Ok(AuthUser {
            owner_id: claims.sub,
            username: claims.username,
            role: claims.role,
        })
    }
}
