//! Job Service
//!
//! Submission, processing and retrieval of image jobs.
//!
//! ```text
//!  submit(seed)   -> processing -> done
//!                             \-> failed
//!  submit(upload) -> waiting_upload
//!  begin_processing: waiting_upload | failed -> processing -> done | failed
//! ```

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use imgpipe_core::domain::job::{Flow, Job, JobPatch, JobStatus, SEED_INPUT_KEY};
use imgpipe_core::domain::step::{StepError, validate_ops};
use imgpipe_core::dto::job::{
    AwaitingUpload, CompletedJob, CreateJob, JobPage, OutputHandle, PageRequest, SubmittedJob,
    UploadHandle,
};
use thiserror::Error;
use uuid::Uuid;

use crate::executor::{PipelineError, PipelineExecutor, placeholder_seed};
use crate::repository::{JobStore, StoreError};
use crate::storage::{ObjectStore, StorageError};

/// Edge length of the generated seed image
const PLACEHOLDER_SEED_SIZE: u32 = 256;

/// Service error type
#[derive(Debug, Error)]
pub enum JobError {
    #[error("{0}")]
    InvalidArgument(#[from] StepError),

    #[error("Job {0} not found")]
    NotFound(Uuid),

    #[error("Job is {0}")]
    InvalidState(JobStatus),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("pipeline task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<StoreError> for JobError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => JobError::NotFound(id),
            StoreError::StateMismatch { current, .. } => JobError::InvalidState(current),
            other => JobError::Store(other),
        }
    }
}

pub struct JobService {
    store: Arc<dyn JobStore>,
    objects: Arc<dyn ObjectStore>,
    executor: Arc<PipelineExecutor>,
}

impl JobService {
    pub fn new(
        store: Arc<dyn JobStore>,
        objects: Arc<dyn ObjectStore>,
        executor: Arc<PipelineExecutor>,
    ) -> Self {
        Self {
            store,
            objects,
            executor,
        }
    }

    /// Create a job for `owner_id`.
    ///
    /// Seed-flow jobs are processed before this returns. Upload-flow jobs
    /// come back with a pre-signed URL for the input image.
    pub async fn submit(&self, owner_id: &str, req: CreateJob) -> Result<SubmittedJob, JobError> {
        validate_ops(&req.ops)?;

        let source_id = req.source_id().to_string();
        let job = Job::new(Uuid::new_v4(), owner_id, source_id, req.ops, Utc::now());
        self.store.create(&job).await?;

        tracing::info!(
            "Job created: {} for {} ({} ops, status {})",
            job.id,
            job.owner_id,
            job.ops.len(),
            job.status
        );

        match job.flow() {
            Flow::Seed => {
                let output = self.execute(&job).await?;
                Ok(SubmittedJob::Completed(CompletedJob { id: job.id, output }))
            }
            Flow::Upload => {
                let url = self.objects.presign_upload(&job.input_key)?;
                Ok(SubmittedJob::AwaitingUpload(AwaitingUpload {
                    id: job.id,
                    upload: UploadHandle {
                        url,
                        key: job.input_key.clone(),
                    },
                    message: "Upload your image to the provided URL, then call the processing \
                              endpoint when ready."
                        .to_string(),
                    input_key: job.input_key,
                    output_key: job.output_key,
                }))
            }
        }
    }

    /// Move a `waiting_upload` or `failed` job to `processing` and run it.
    ///
    /// Any other current status fails with `InvalidState` and leaves the
    /// job untouched.
    pub async fn begin_processing(&self, id: Uuid) -> Result<CompletedJob, JobError> {
        let job = self
            .store
            .transition(id, &JobStatus::PROCESSABLE, &JobPatch::processing())
            .await?;

        tracing::info!("Job {} processing", id);

        let output = self.execute(&job).await?;
        Ok(CompletedJob { id, output })
    }

    pub async fn get_job(&self, id: Uuid) -> Result<Job, JobError> {
        Ok(self.store.get_by_id(id).await?)
    }

    pub async fn list_jobs(&self, owner_id: &str, page: PageRequest) -> Result<JobPage, JobError> {
        Ok(self.store.list(owner_id, page).await?)
    }

    /// Output bytes of a finished job
    pub async fn fetch_output(&self, id: Uuid) -> Result<Vec<u8>, JobError> {
        let job = self.store.get_by_id(id).await?;
        if job.status != JobStatus::Done {
            return Err(JobError::InvalidState(job.status));
        }

        Ok(self.objects.get(&job.output_key).await?)
    }

    /// Store a seed input image unless one is already present.
    ///
    /// Uses the image at `source` when given, otherwise a generated
    /// gradient. Returns whether anything was written.
    pub async fn ensure_seed(&self, source: Option<&Path>) -> Result<bool, JobError> {
        if self.objects.exists(SEED_INPUT_KEY).await? {
            return Ok(false);
        }

        let bytes = match source {
            Some(path) => tokio::fs::read(path).await.map_err(StorageError::Io)?,
            None => placeholder_seed(PLACEHOLDER_SEED_SIZE, PLACEHOLDER_SEED_SIZE)?,
        };

        self.objects.put(SEED_INPUT_KEY, bytes).await?;
        tracing::info!("Seed image written to {}", SEED_INPUT_KEY);
        Ok(true)
    }

    /// Run a job that is already `processing` and record the outcome.
    async fn execute(&self, job: &Job) -> Result<OutputHandle, JobError> {
        if let Err(err) = self.run_pipeline(job).await {
            self.mark_failed(job.id, &err).await;
            return Err(err);
        }

        let done = match self.store.update(job.id, &JobPatch::done(Utc::now())).await {
            Ok(done) => done,
            Err(err) => {
                let err = JobError::from(err);
                self.mark_failed(job.id, &err).await;
                return Err(err);
            }
        };

        tracing::info!("Job {} done", job.id);

        let url = self.objects.presign_download(&done.output_key)?;
        Ok(OutputHandle {
            image_id: done.id,
            url,
        })
    }

    async fn run_pipeline(&self, job: &Job) -> Result<(), JobError> {
        let input = self.objects.get(&job.input_key).await?;

        let executor = Arc::clone(&self.executor);
        let ops = job.ops.clone();
        let output = tokio::task::spawn_blocking(move || executor.run(&input, &ops)).await??;

        self.objects.put(&job.output_key, output).await?;
        Ok(())
    }

    /// Best effort: the caller reports `cause` whether or not this succeeds.
    async fn mark_failed(&self, id: Uuid, cause: &JobError) {
        tracing::error!("Job {} failed: {}", id, cause);

        let patch = JobPatch::failed(Utc::now(), cause.to_string());
        if let Err(err) = self.store.update(id, &patch).await {
            tracing::warn!("Could not mark job {} as failed: {}", id, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgpipe_core::domain::step::Step;

    use crate::test_support::{Harness, sample_png};

    fn ops() -> Vec<Step> {
        vec![
            Step::Resize {
                width: 16,
                height: 8,
            },
            Step::Blur { sigma: 1.0 },
        ]
    }

    fn seed_request() -> CreateJob {
        CreateJob {
            source_id: None,
            ops: ops(),
        }
    }

    fn upload_request() -> CreateJob {
        CreateJob {
            source_id: Some("upload".to_string()),
            ops: ops(),
        }
    }

    fn expect_awaiting(submitted: SubmittedJob) -> AwaitingUpload {
        match submitted {
            SubmittedJob::AwaitingUpload(job) => job,
            other => panic!("expected upload flow, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_seed_submission_completes() {
        let h = Harness::new().await;

        let submitted = h.service.submit("alice", seed_request()).await.unwrap();
        let completed = match submitted {
            SubmittedJob::Completed(job) => job,
            other => panic!("expected seed flow, got {:?}", other),
        };
        assert_eq!(completed.output.image_id, completed.id);

        let job = h.service.get_job(completed.id).await.unwrap();
        assert_eq!(job.status, JobStatus::Done);
        assert!(job.finished_at.is_some());
        assert!(job.error.is_none());
        assert_eq!(job.input_key, SEED_INPUT_KEY);
        assert!(completed.output.url.contains(&job.output_key));

        let output = h.objects.get(&job.output_key).await.unwrap();
        let image = image::load_from_memory(&output).unwrap();
        assert_eq!((image.width(), image.height()), (16, 8));
    }

    #[tokio::test]
    async fn test_empty_ops_rejected_without_record() {
        let h = Harness::new().await;
        let req = CreateJob {
            source_id: None,
            ops: vec![],
        };

        let err = h.service.submit("alice", req).await.unwrap_err();
        assert!(matches!(err, JobError::InvalidArgument(StepError::EmptyPipeline)));
        assert_eq!(h.store.count().await, 0);
    }

    #[tokio::test]
    async fn test_invalid_step_rejected_without_record() {
        let h = Harness::new().await;
        let req = CreateJob {
            source_id: Some("upload".to_string()),
            ops: vec![Step::Resize {
                width: 0,
                height: 10,
            }],
        };

        let err = h.service.submit("alice", req).await.unwrap_err();
        assert!(matches!(err, JobError::InvalidArgument(_)));
        assert_eq!(h.store.count().await, 0);
    }

    #[tokio::test]
    async fn test_upload_submission_waits() {
        let h = Harness::new().await;

        let awaiting = expect_awaiting(h.service.submit("bob", upload_request()).await.unwrap());
        assert_eq!(awaiting.upload.key, awaiting.input_key);
        assert_eq!(awaiting.input_key, format!("users/bob/jobs/{}/input", awaiting.id));
        assert!(awaiting.upload.url.contains(&awaiting.input_key));

        let job = h.service.get_job(awaiting.id).await.unwrap();
        assert_eq!(job.status, JobStatus::WaitingUpload);
        assert!(!h.objects.exists(&job.output_key).await.unwrap());
    }

    #[tokio::test]
    async fn test_long_source_id_is_kept_whole() {
        let h = Harness::new().await;
        let source_id = "camera-".repeat(50);
        let req = CreateJob {
            source_id: Some(source_id.clone()),
            ops: ops(),
        };

        let awaiting = expect_awaiting(h.service.submit("bob", req).await.unwrap());
        let job = h.service.get_job(awaiting.id).await.unwrap();
        assert_eq!(job.source_id.len(), 350);
        assert_eq!(job.source_id, source_id);
    }

    #[tokio::test]
    async fn test_processing_without_upload_fails_job() {
        let h = Harness::new().await;
        let awaiting = expect_awaiting(h.service.submit("bob", upload_request()).await.unwrap());

        let err = h.service.begin_processing(awaiting.id).await.unwrap_err();
        assert!(matches!(err, JobError::Storage(StorageError::NotFound(_))));

        let job = h.service.get_job(awaiting.id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.finished_at.is_some());
        assert!(job.error.is_some());
    }

    #[tokio::test]
    async fn test_retry_after_upload_succeeds() {
        let h = Harness::new().await;
        let awaiting = expect_awaiting(h.service.submit("bob", upload_request()).await.unwrap());
        assert!(h.service.begin_processing(awaiting.id).await.is_err());

        h.objects
            .put(&awaiting.input_key, sample_png(24, 24))
            .await
            .unwrap();

        let completed = h.service.begin_processing(awaiting.id).await.unwrap();
        assert_eq!(completed.id, awaiting.id);

        let job = h.service.get_job(awaiting.id).await.unwrap();
        assert_eq!(job.status, JobStatus::Done);
        assert!(job.error.is_none());
        assert!(h.objects.exists(&awaiting.output_key).await.unwrap());
    }

    #[tokio::test]
    async fn test_processing_done_job_is_invalid_state() {
        let h = Harness::new().await;
        let id = h.service.submit("alice", seed_request()).await.unwrap().id();
        let before = h.service.get_job(id).await.unwrap();

        let err = h.service.begin_processing(id).await.unwrap_err();
        assert!(matches!(err, JobError::InvalidState(JobStatus::Done)));
        assert_eq!(err.to_string(), "Job is done");

        assert_eq!(h.service.get_job(id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_processing_busy_job_is_invalid_state() {
        let h = Harness::new().await;
        let awaiting = expect_awaiting(h.service.submit("bob", upload_request()).await.unwrap());
        h.store
            .update(awaiting.id, &JobPatch::processing())
            .await
            .unwrap();
        let before = h.service.get_job(awaiting.id).await.unwrap();

        let err = h.service.begin_processing(awaiting.id).await.unwrap_err();
        assert!(matches!(err, JobError::InvalidState(JobStatus::Processing)));
        assert_eq!(h.service.get_job(awaiting.id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_processing_unknown_job_is_not_found() {
        let h = Harness::new().await;
        let id = Uuid::new_v4();

        let err = h.service.begin_processing(id).await.unwrap_err();
        assert!(matches!(err, JobError::NotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn test_concurrent_processing_has_one_winner() {
        let h = Harness::new().await;
        let awaiting = expect_awaiting(h.service.submit("bob", upload_request()).await.unwrap());
        h.objects
            .put(&awaiting.input_key, sample_png(24, 24))
            .await
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let service = Arc::clone(&h.service);
                let id = awaiting.id;
                tokio::spawn(async move { service.begin_processing(id).await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(JobError::InvalidState(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_owner() {
        let h = Harness::new().await;
        for _ in 0..3 {
            h.service.submit("alice", upload_request()).await.unwrap();
        }
        h.service.submit("bob", upload_request()).await.unwrap();

        let page = h
            .service
            .list_jobs("alice", PageRequest::new(1, 2))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert!(page.items.iter().all(|job| job.owner_id == "alice"));
    }

    #[tokio::test]
    async fn test_fetch_output() {
        let h = Harness::new().await;
        let id = h.service.submit("alice", seed_request()).await.unwrap().id();

        let bytes = h.service.fetch_output(id).await.unwrap();
        assert!(image::load_from_memory(&bytes).is_ok());

        let waiting = h.service.submit("alice", upload_request()).await.unwrap().id();
        let err = h.service.fetch_output(waiting).await.unwrap_err();
        assert!(matches!(err, JobError::InvalidState(JobStatus::WaitingUpload)));
    }

    #[tokio::test]
    async fn test_ensure_seed_writes_once() {
        let h = Harness::empty();

        assert!(h.service.ensure_seed(None).await.unwrap());
        assert!(!h.service.ensure_seed(None).await.unwrap());

        let seed = h.objects.get(SEED_INPUT_KEY).await.unwrap();
        let image = image::load_from_memory(&seed).unwrap();
        assert_eq!(image.width(), PLACEHOLDER_SEED_SIZE);
    }

    #[tokio::test]
    async fn test_ensure_seed_from_file() {
        let h = Harness::empty();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.png");
        std::fs::write(&path, sample_png(10, 10)).unwrap();

        assert!(h.service.ensure_seed(Some(&path)).await.unwrap());
        assert_eq!(
            h.objects.get(SEED_INPUT_KEY).await.unwrap(),
            sample_png(10, 10)
        );
    }
}
