//! # Task Runner Client
//!
//! Wraps the task-runner HTTP API. Child URLs are composed by
//! concatenating the runner's base address (a full URL prefix, no
//! trailing slash) with `/start`, `/status/{id}`, `/cancel/{id}`,
//! `/delete/{id}`, `/alive` and `/tasks`.

use jobcoord_shared::types::{TaskListResponse, TaskSpec, TaskStartResponse, TaskStatusResponse};

use crate::error::{ClientError, ClientResult};

/// Client for one task runner endpoint.
#[derive(Debug, Clone)]
pub struct RunnerClient {
    base: String,
    http: reqwest::Client,
}

impl RunnerClient {
    /// Create a client with its own connection pool.
    pub fn new(base: impl Into<String>) -> Self {
        Self::with_http(base, reqwest::Client::new())
    }

    /// Create a client sharing an existing `reqwest::Client`. The
    /// coordinator hands every runner client the same pool.
    pub fn with_http(base: impl Into<String>, http: reqwest::Client) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base, http }
    }

    /// The runner's base address.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// POST `/start` — returns the minted task id on acceptance.
    pub async fn start(&self, spec: &TaskSpec) -> ClientResult<String> {
        let response = self
            .http
            .post(format!("{}/start", self.base))
            .json(spec)
            .send()
            .await?;
        let response = check_status(response).await?;
        let body: TaskStartResponse = response.json().await?;
        Ok(body.id)
    }

    /// GET `/status/{id}`.
    pub async fn status(&self, task_id: &str) -> ClientResult<TaskStatusResponse> {
        let response = self
            .http
            .get(format!("{}/status/{}", self.base, task_id))
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// POST `/cancel/{id}`. Idempotent on the runner side.
    pub async fn cancel(&self, task_id: &str) -> ClientResult<()> {
        let response = self
            .http
            .post(format!("{}/cancel/{}", self.base, task_id))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// POST `/delete/{id}`. Fails while the task is still running.
    pub async fn delete(&self, task_id: &str) -> ClientResult<()> {
        let response = self
            .http
            .post(format!("{}/delete/{}", self.base, task_id))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// GET `/alive` — liveness probe.
    pub async fn alive(&self) -> ClientResult<()> {
        let response = self.http.get(format!("{}/alive", self.base)).send().await?;
        check_status(response).await?;
        Ok(())
    }

    /// GET `/tasks` — ids of every registered task.
    pub async fn tasks(&self) -> ClientResult<Vec<String>> {
        let response = self.http.get(format!("{}/tasks", self.base)).send().await?;
        let response = check_status(response).await?;
        let body: TaskListResponse = response.json().await?;
        Ok(body.tasks)
    }
}

/// Turn a non-2xx response into `ClientError::Api`, keeping the body as
/// the message.
pub(crate) async fn check_status(response: reqwest::Response) -> ClientResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(ClientError::api_error(
        status.as_u16(),
        message.trim().to_string(),
    ))
}
