//! Postgres job store
//!
//! `id` is the primary key, which doubles as the id -> owner index.
//! `seq` records insertion order for owner listings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use imgpipe_core::domain::job::{Job, JobPatch, JobStatus};
use imgpipe_core::dto::job::{JobPage, PageRequest};
use sqlx::PgPool;
use uuid::Uuid;

use super::job::{JobStore, StoreError};

const JOB_COLUMNS: &str = "id, owner_id, source_id, ops, status, created_at, finished_at, \
                           input_key, output_key, error";

pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the sparse update, optionally guarded by the current status.
    ///
    /// Returns `None` when no row matched.
    async fn apply_patch(
        &self,
        id: Uuid,
        expected: Option<&[JobStatus]>,
        patch: &JobPatch,
    ) -> Result<Option<Job>, StoreError> {
        let guard = if expected.is_some() {
            "AND status = ANY($7)"
        } else {
            ""
        };
        let sql = format!(
            r#"
            UPDATE jobs
            SET status = COALESCE($2::varchar, status),
                finished_at = CASE WHEN $3 THEN $4::timestamptz ELSE finished_at END,
                error = CASE WHEN $5 THEN $6::text ELSE error END
            WHERE id = $1 {guard}
            RETURNING {columns}
            "#,
            guard = guard,
            columns = JOB_COLUMNS,
        );

        let mut query = sqlx::query_as::<_, JobRow>(&sql)
            .bind(id)
            .bind(patch.status.map(JobStatus::as_str))
            .bind(patch.finished_at.is_some())
            .bind(patch.finished_at.flatten())
            .bind(patch.error.is_some())
            .bind(patch.error.clone().flatten());
        if let Some(expected) = expected {
            let statuses: Vec<&str> = expected.iter().map(|s| s.as_str()).collect();
            query = query.bind(statuses);
        }

        query
            .fetch_optional(&self.pool)
            .await?
            .map(Job::try_from)
            .transpose()
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn create(&self, job: &Job) -> Result<(), StoreError> {
        let ops = serde_json::to_value(&job.ops).map_err(|e| StoreError::Corrupt {
            id: job.id,
            reason: e.to_string(),
        })?;

        let result = sqlx::query(
            r#"
            INSERT INTO jobs (id, owner_id, source_id, ops, status, created_at,
                              finished_at, input_key, output_key, error)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(job.id)
        .bind(&job.owner_id)
        .bind(&job.source_id)
        .bind(ops)
        .bind(job.status.as_str())
        .bind(job.created_at)
        .bind(job.finished_at)
        .bind(&job.input_key)
        .bind(&job.output_key)
        .bind(&job.error)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Conflict(job.id))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn update(&self, id: Uuid, patch: &JobPatch) -> Result<Job, StoreError> {
        self.apply_patch(id, None, patch)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn transition(
        &self,
        id: Uuid,
        expected: &[JobStatus],
        patch: &JobPatch,
    ) -> Result<Job, StoreError> {
        match self.apply_patch(id, Some(expected), patch).await? {
            Some(job) => Ok(job),
            None => {
                // Either the job is gone or its status did not match
                let current = self.get_by_id(id).await?;
                Err(StoreError::StateMismatch {
                    id,
                    current: current.status,
                })
            }
        }
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Job, StoreError> {
        let sql = format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS);
        sqlx::query_as::<_, JobRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(id))
            .and_then(Job::try_from)
    }

    async fn list(&self, owner_id: &str, page: PageRequest) -> Result<JobPage, StoreError> {
        let sql = format!(
            "SELECT {} FROM jobs WHERE owner_id = $1 ORDER BY seq ASC LIMIT $2 OFFSET $3",
            JOB_COLUMNS
        );
        let rows = sqlx::query_as::<_, JobRow>(&sql)
            .bind(owner_id)
            .bind(page.limit as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(Job::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(JobPage {
            items,
            page: page.page,
            limit: page.limit,
            total: total as usize,
        })
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    owner_id: String,
    source_id: String,
    ops: serde_json::Value,
    status: String,
    created_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    input_key: String,
    output_key: String,
    error: Option<String>,
}

impl TryFrom<JobRow> for Job {
    type Error = StoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |reason: String| StoreError::Corrupt { id, reason };
        let status = row.status.parse::<JobStatus>().map_err(corrupt)?;
        let ops = serde_json::from_value(row.ops).map_err(|e| corrupt(e.to_string()))?;

        Ok(Job {
            id: row.id,
            owner_id: row.owner_id,
            source_id: row.source_id,
            ops,
            status,
            created_at: row.created_at,
            finished_at: row.finished_at,
            input_key: row.input_key,
            output_key: row.output_key,
            error: row.error,
        })
    }
}
