//! In-memory job store
//!
//! Jobs are kept in per-owner partitions in insertion order. A secondary
//! index maps each job id to its owner and position, and is written under
//! the same lock as the partition, so id lookups never scan.

use std::collections::HashMap;

use async_trait::async_trait;
use imgpipe_core::domain::job::{Job, JobPatch, JobStatus};
use imgpipe_core::dto::job::{JobPage, PageRequest};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::job::{JobStore, StoreError};

#[derive(Default)]
struct Partitions {
    by_owner: HashMap<String, Vec<Job>>,
    /// job id -> (owner, index in that owner's partition)
    index: HashMap<Uuid, (String, usize)>,
}

impl Partitions {
    fn locate(&self, id: Uuid) -> Result<&Job, StoreError> {
        let (owner, position) = self.index.get(&id).ok_or(StoreError::NotFound(id))?;
        self.by_owner
            .get(owner)
            .and_then(|jobs| jobs.get(*position))
            .ok_or(StoreError::NotFound(id))
    }

    fn locate_mut(&mut self, id: Uuid) -> Result<&mut Job, StoreError> {
        let (owner, position) = self.index.get(&id).ok_or(StoreError::NotFound(id))?;
        self.by_owner
            .get_mut(owner)
            .and_then(|jobs| jobs.get_mut(*position))
            .ok_or(StoreError::NotFound(id))
    }
}

#[derive(Default)]
pub struct MemoryJobStore {
    inner: RwLock<Partitions>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs across all owners
    pub async fn count(&self) -> usize {
        self.inner.read().await.index.len()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, job: &Job) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.index.contains_key(&job.id) {
            return Err(StoreError::Conflict(job.id));
        }

        let partition = inner.by_owner.entry(job.owner_id.clone()).or_default();
        partition.push(job.clone());
        let position = partition.len() - 1;
        inner.index.insert(job.id, (job.owner_id.clone(), position));

        Ok(())
    }

    async fn update(&self, id: Uuid, patch: &JobPatch) -> Result<Job, StoreError> {
        let mut inner = self.inner.write().await;
        let job = inner.locate_mut(id)?;
        job.apply(patch);
        Ok(job.clone())
    }

    async fn transition(
        &self,
        id: Uuid,
        expected: &[JobStatus],
        patch: &JobPatch,
    ) -> Result<Job, StoreError> {
        let mut inner = self.inner.write().await;
        let job = inner.locate_mut(id)?;
        if !expected.contains(&job.status) {
            return Err(StoreError::StateMismatch {
                id,
                current: job.status,
            });
        }

        job.apply(patch);
        Ok(job.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Job, StoreError> {
        self.inner.read().await.locate(id).cloned()
    }

    async fn list(&self, owner_id: &str, page: PageRequest) -> Result<JobPage, StoreError> {
        let inner = self.inner.read().await;
        let jobs = inner
            .by_owner
            .get(owner_id)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let items = jobs
            .iter()
            .skip(page.offset())
            .take(page.limit)
            .cloned()
            .collect();

        Ok(JobPage {
            items,
            page: page.page,
            limit: page.limit,
            total: jobs.len(),
        })
    }
}
