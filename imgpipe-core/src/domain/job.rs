//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::step::Step;

/// Source id that selects the pre-seeded input image
pub const SEED_SOURCE_ID: &str = "seed";

/// Object key of the pre-seeded input image
pub const SEED_INPUT_KEY: &str = "seed/seed.png";

/// Image processing job
///
/// Persisted by the server's job store. Everything except `status`,
/// `finished_at` and `error` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub owner_id: String,
    pub source_id: String,
    pub ops: Vec<Step>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub input_key: String,
    pub output_key: String,
    /// Message of the most recent failure, cleared on retry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Job {
    /// Build a freshly submitted job.
    ///
    /// The flow, initial status and storage keys all follow from `source_id`.
    pub fn new(
        id: Uuid,
        owner_id: impl Into<String>,
        source_id: impl Into<String>,
        ops: Vec<Step>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let owner_id = owner_id.into();
        let source_id = source_id.into();
        let flow = Flow::from_source_id(&source_id);
        let keys = JobKeys::derive(flow, &owner_id, id);

        Self {
            id,
            owner_id,
            source_id,
            ops,
            status: flow.initial_status(),
            created_at,
            finished_at: None,
            input_key: keys.input_key,
            output_key: keys.output_key,
            error: None,
        }
    }

    pub fn flow(&self) -> Flow {
        Flow::from_source_id(&self.source_id)
    }

    /// Sparse merge: only fields present in `patch` are written.
    pub fn apply(&mut self, patch: &JobPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(finished_at) = patch.finished_at {
            self.finished_at = finished_at;
        }
        if let Some(error) = &patch.error {
            self.error = error.clone();
        }
    }
}

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    WaitingUpload,
    Processing,
    Done,
    Failed,
}

impl JobStatus {
    /// States from which processing may be (re)started
    pub const PROCESSABLE: [JobStatus; 2] = [JobStatus::WaitingUpload, JobStatus::Failed];

    pub fn can_begin_processing(self) -> bool {
        Self::PROCESSABLE.contains(&self)
    }

    /// `Done` is the only state nothing leaves
    pub fn is_terminal(self) -> bool {
        self == JobStatus::Done
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::WaitingUpload => "waiting_upload",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting_upload" => Ok(JobStatus::WaitingUpload),
            "processing" => Ok(JobStatus::Processing),
            "done" => Ok(JobStatus::Done),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status '{}'", other)),
        }
    }
}

/// How the input image reaches the job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Input is the well-known seed image; processed inside the submit request
    Seed,
    /// Client uploads the input first, then triggers processing
    Upload,
}

impl Flow {
    pub fn from_source_id(source_id: &str) -> Self {
        if source_id == SEED_SOURCE_ID {
            Flow::Seed
        } else {
            Flow::Upload
        }
    }

    pub fn initial_status(self) -> JobStatus {
        match self {
            Flow::Seed => JobStatus::Processing,
            Flow::Upload => JobStatus::WaitingUpload,
        }
    }
}

/// Object-store locations of a job's input and output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobKeys {
    pub input_key: String,
    pub output_key: String,
}

impl JobKeys {
    pub fn derive(flow: Flow, owner_id: &str, job_id: Uuid) -> Self {
        let prefix = format!("users/{}/jobs/{}", owner_id, job_id);
        let input_key = match flow {
            Flow::Seed => SEED_INPUT_KEY.to_string(),
            Flow::Upload => format!("{}/input", prefix),
        };

        Self {
            input_key,
            output_key: format!("{}/output.png", prefix),
        }
    }
}

/// Partial update of a job's mutable fields
///
/// `None` leaves a field untouched. For the optional fields, `Some(None)`
/// clears the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub finished_at: Option<Option<DateTime<Utc>>>,
    pub error: Option<Option<String>>,
}

impl JobPatch {
    /// Enter `processing`, dropping the outcome of any earlier attempt
    pub fn processing() -> Self {
        Self {
            status: Some(JobStatus::Processing),
            finished_at: Some(None),
            error: Some(None),
        }
    }

    pub fn done(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(JobStatus::Done),
            finished_at: Some(Some(at)),
            error: None,
        }
    }

    pub fn failed(at: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            finished_at: Some(Some(at)),
            error: Some(Some(message.into())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.finished_at.is_none() && self.error.is_none()
    }
}
