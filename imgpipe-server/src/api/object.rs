//! Pre-signed object access
//!
//! These routes take no bearer token. The `token` query parameter is a grant
//! issued by [`UrlSigner`](crate::storage::UrlSigner) for one key and one
//! access mode.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::api::error::ApiResult;
use crate::state::AppState;
use crate::storage::{GrantError, ObjectAccess, content_type_for};

#[derive(Debug, Default, Deserialize)]
pub struct GrantQuery {
    pub token: Option<String>,
}

impl GrantQuery {
    fn token(&self) -> Result<&str, GrantError> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(GrantError::Missing)
    }
}

/// GET /v1/objects/{*key}?token=
pub async fn get_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<GrantQuery>,
) -> ApiResult<Response> {
    let key = key.trim_start_matches('/');
    state.signer.verify(query.token()?, key, ObjectAccess::Read)?;

    let bytes = state.objects.get(key).await?;
    Ok(([(header::CONTENT_TYPE, content_type_for(key))], bytes).into_response())
}

/// PUT /v1/objects/{*key}?token=
pub async fn put_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<GrantQuery>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let key = key.trim_start_matches('/');
    state.signer.verify(query.token()?, key, ObjectAccess::Write)?;

    tracing::debug!("Storing {} bytes at {}", body.len(), key);
    state.objects.put(key, body.to_vec()).await?;
    Ok(StatusCode::OK)
}
