//! # Coordinator Client

use jobcoord_shared::types::{
    ConnectionRequest, JobListResponse, JobSpec, JobStartResponse, JobStatusResponse,
    RunnerListResponse,
};

use crate::error::ClientResult;
use crate::runner::check_status;

/// Client for a coordinator endpoint.
#[derive(Debug, Clone)]
pub struct CoordinatorClient {
    base: String,
    http: reqwest::Client,
}

impl CoordinatorClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self::with_http(base, reqwest::Client::new())
    }

    pub fn with_http(base: impl Into<String>, http: reqwest::Client) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base, http }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// POST `/start` — submit a job, returns the job id.
    pub async fn start_job(&self, spec: &JobSpec) -> ClientResult<String> {
        let response = self
            .http
            .post(format!("{}/start", self.base))
            .json(spec)
            .send()
            .await?;
        let response = check_status(response).await?;
        let body: JobStartResponse = response.json().await?;
        Ok(body.id)
    }

    /// POST `/cancel/{id}` — fire the job's cancel signal.
    pub async fn cancel_job(&self, job_id: &str) -> ClientResult<()> {
        let response = self
            .http
            .post(format!("{}/cancel/{}", self.base, job_id))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// GET `/status/{id}`.
    pub async fn job_status(&self, job_id: &str) -> ClientResult<JobStatusResponse> {
        let response = self
            .http
            .get(format!("{}/status/{}", self.base, job_id))
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// POST `/connect` — add a runner address to the pool.
    pub async fn connect(&self, address: impl Into<String>) -> ClientResult<()> {
        let request = ConnectionRequest {
            address: address.into(),
        };
        let response = self
            .http
            .post(format!("{}/connect", self.base))
            .json(&request)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// POST `/disconnect` — remove a runner address from the pool.
    pub async fn disconnect(&self, address: impl Into<String>) -> ClientResult<()> {
        let request = ConnectionRequest {
            address: address.into(),
        };
        let response = self
            .http
            .post(format!("{}/disconnect", self.base))
            .json(&request)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// GET `/runners` — the current pool membership snapshot.
    pub async fn runners(&self) -> ClientResult<Vec<String>> {
        let response = self
            .http
            .get(format!("{}/runners", self.base))
            .send()
            .await?;
        let response = check_status(response).await?;
        let body: RunnerListResponse = response.json().await?;
        Ok(body.runners)
    }

    /// GET `/jobs` — ids of every job the coordinator has accepted.
    pub async fn jobs(&self) -> ClientResult<Vec<String>> {
        let response = self.http.get(format!("{}/jobs", self.base)).send().await?;
        let response = check_status(response).await?;
        let body: JobListResponse = response.json().await?;
        Ok(body.jobs)
    }
}
