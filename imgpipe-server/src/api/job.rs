//! Job API Handlers
//!
//! HTTP endpoints for job submission, processing and retrieval.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use imgpipe_core::domain::job::Job;
use imgpipe_core::dto::job::{CompletedJob, CreateJob, JobPage, ListJobsQuery, SubmittedJob};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::auth::AuthUser;
use crate::state::AppState;

/// Ids that are not UUIDs cannot name a job
fn parse_job_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(format!("Job {} not found", raw)))
}

/// POST /v1/jobs
/// Submit a job. Seed-flow jobs are processed before the response.
pub async fn create_job(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CreateJob>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SubmittedJob>)> {
    let Json(req) = payload?;
    tracing::info!(
        "Submitting job for {} (source {})",
        user.owner_id,
        req.source_id()
    );

    let submitted = state.jobs.submit(&user.owner_id, req).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

/// POST /v1/jobs/{id}/process
/// Run an uploaded or previously failed job
pub async fn process_job(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<CompletedJob>> {
    let id = parse_job_id(&id)?;
    let completed = state.jobs.begin_processing(id).await?;
    Ok(Json(completed))
}

/// GET /v1/jobs
/// List the caller's jobs, paginated
pub async fn list_jobs(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<ListJobsQuery>, QueryRejection>,
) -> ApiResult<Json<JobPage>> {
    let page = query
        .map(|Query(q)| q.page_request())
        .unwrap_or_default();
    tracing::debug!(
        "Listing jobs for {} (page {}, limit {})",
        user.owner_id,
        page.page,
        page.limit
    );

    let jobs = state.jobs.list_jobs(&user.owner_id, page).await?;
    Ok(Json(jobs))
}

/// GET /v1/jobs/{id}
/// Get job details by ID
pub async fn get_job(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Job>> {
    let id = parse_job_id(&id)?;
    tracing::debug!("Getting job: {}", id);

    let job = state.jobs.get_job(id).await?;
    Ok(Json(job))
}

/// GET /v1/images/{id}
/// PNG output of a finished job
pub async fn get_image(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_job_id(&id)?;
    let bytes = state.jobs.fetch_output(id).await?;

    Ok(([(header::CONTENT_TYPE, "image/png")], bytes).into_response())
}
