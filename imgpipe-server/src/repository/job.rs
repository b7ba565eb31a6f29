//! Job Repository contract
//!
//! Jobs are partitioned by owner. Every backing must still resolve a bare
//! job id to exactly one record, whichever owner it belongs to.

use async_trait::async_trait;
use imgpipe_core::domain::job::{Job, JobPatch, JobStatus};
use imgpipe_core::dto::job::{JobPage, PageRequest};
use thiserror::Error;
use uuid::Uuid;

/// Repository error type
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job {0} already exists")]
    Conflict(Uuid),

    #[error("job {0} not found")]
    NotFound(Uuid),

    /// A conditional transition found the job in another state
    #[error("job {id} is {current}")]
    StateMismatch { id: Uuid, current: JobStatus },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt job record {id}: {reason}")]
    Corrupt { id: Uuid, reason: String },
}

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new job. Fails with `Conflict` if the id is taken by any owner.
    async fn create(&self, job: &Job) -> Result<(), StoreError>;

    /// Sparse-merge `patch` into the job and return the stored result
    async fn update(&self, id: Uuid, patch: &JobPatch) -> Result<Job, StoreError>;

    /// Apply `patch` only if the job's current status is one of `expected`.
    ///
    /// The check and the write happen atomically, so of several concurrent
    /// callers at most one sees success.
    async fn transition(
        &self,
        id: Uuid,
        expected: &[JobStatus],
        patch: &JobPatch,
    ) -> Result<Job, StoreError>;

    /// Find a job by id regardless of owner
    async fn get_by_id(&self, id: Uuid) -> Result<Job, StoreError>;

    /// One page of an owner's jobs in creation order, plus the owner's total
    async fn list(&self, owner_id: &str, page: PageRequest) -> Result<JobPage, StoreError>;
}
