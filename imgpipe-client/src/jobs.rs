//! Job-related API endpoints

use imgpipe_core::domain::job::Job;
use imgpipe_core::dto::job::{CompletedJob, CreateJob, JobPage, PageRequest, SubmittedJob};
use uuid::Uuid;

use crate::ImgpipeClient;
use crate::error::Result;

impl ImgpipeClient {
    /// Submit a new job
    ///
    /// Seed-flow jobs come back completed; upload-flow jobs come back with
    /// an upload URL.
    ///
    /// # Example
    /// ```no_run
    /// # use imgpipe_client::ImgpipeClient;
    /// # use imgpipe_core::domain::step::Step;
    /// # use imgpipe_core::dto::job::CreateJob;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = ImgpipeClient::new("http://localhost:8080").with_token("...");
    /// let job = client.submit_job(CreateJob {
    ///     source_id: Some("upload".to_string()),
    ///     ops: vec![Step::Resize { width: 640, height: 480 }],
    /// }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn submit_job(&self, req: CreateJob) -> Result<SubmittedJob> {
        let request = self.client.post(self.url("/v1/jobs")).json(&req);
        let response = self.authorized(request)?.send().await?;

        Self::handle_response(response).await
    }

    /// Start processing an uploaded (or failed) job and wait for the result
    pub async fn process_job(&self, job_id: Uuid) -> Result<CompletedJob> {
        let request = self
            .client
            .post(self.url(&format!("/v1/jobs/{}/process", job_id)));
        let response = self.authorized(request)?.send().await?;

        Self::handle_response(response).await
    }

    /// Get a job by ID
    pub async fn get_job(&self, job_id: Uuid) -> Result<Job> {
        let request = self.client.get(self.url(&format!("/v1/jobs/{}", job_id)));
        let response = self.authorized(request)?.send().await?;

        Self::handle_response(response).await
    }

    /// One page of the caller's jobs
    pub async fn list_jobs(&self, page: PageRequest) -> Result<JobPage> {
        let request = self
            .client
            .get(self.url("/v1/jobs"))
            .query(&[("page", page.page), ("limit", page.limit)]);
        let response = self.authorized(request)?.send().await?;

        Self::handle_response(response).await
    }

    /// PNG bytes of a finished job's output
    pub async fn fetch_image(&self, job_id: Uuid) -> Result<Vec<u8>> {
        let request = self.client.get(self.url(&format!("/v1/images/{}", job_id)));
        let response = self.authorized(request)?.send().await?;

        Self::handle_bytes(response).await
    }
}
