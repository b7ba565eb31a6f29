//! Job DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::job::{Job, SEED_SOURCE_ID};
use crate::domain::step::Step;

/// Page size used when the caller does not ask for one
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Upper bound on the page size
pub const MAX_PAGE_SIZE: usize = 100;

/// Body of `POST /v1/jobs`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJob {
    /// `"seed"` (the default) or any other id for the upload flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default)]
    pub ops: Vec<Step>,
}

impl CreateJob {
    pub fn source_id(&self) -> &str {
        self.source_id.as_deref().unwrap_or(SEED_SOURCE_ID)
    }
}

/// Time-limited link to a finished job's output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputHandle {
    pub image_id: Uuid,
    pub url: String,
}

/// Time-limited link the client PUTs its input image to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadHandle {
    pub url: String,
    pub key: String,
}

/// A job whose output is ready
///
/// Returned by a seed-flow submission and by `POST /v1/jobs/{id}/process`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedJob {
    pub id: Uuid,
    pub output: OutputHandle,
}

/// An upload-flow job waiting for its input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwaitingUpload {
    pub id: Uuid,
    pub input_key: String,
    pub output_key: String,
    pub upload: UploadHandle,
    pub message: String,
}

/// Response of `POST /v1/jobs`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmittedJob {
    Completed(CompletedJob),
    AwaitingUpload(AwaitingUpload),
}

impl SubmittedJob {
    pub fn id(&self) -> Uuid {
        match self {
            SubmittedJob::Completed(job) => job.id,
            SubmittedJob::AwaitingUpload(job) => job.id,
        }
    }
}

/// Clamped pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-indexed page number
    pub page: usize,
    /// Items per page, within `1..=MAX_PAGE_SIZE`
    pub limit: usize,
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: page.max(1) as usize,
            limit: limit.clamp(1, MAX_PAGE_SIZE as i64) as usize,
        }
    }

    /// Number of items skipped before this page
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Query string of `GET /v1/jobs`
///
/// Kept as raw strings: values that do not parse fall back to the defaults
/// instead of failing the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListJobsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListJobsQuery {
    pub fn page_request(&self) -> PageRequest {
        let parse = |raw: &Option<String>| raw.as_deref().and_then(|s| s.trim().parse::<i64>().ok());
        let defaults = PageRequest::default();

        PageRequest::new(
            parse(&self.page).unwrap_or(defaults.page as i64),
            parse(&self.limit).unwrap_or(defaults.limit as i64),
        )
    }
}

/// One page of a caller's jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPage {
    pub items: Vec<Job>,
    pub page: usize,
    pub limit: usize,
    /// Total number of jobs the owner has, independent of the window
    pub total: usize,
}
