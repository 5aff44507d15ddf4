//! # Error Taxonomy
//!
//! Unified error type for the coordinator and task-runner engines. Each
//! variant maps to an HTTP status code; the web layers return `CoordError`
//! straight from their handlers via the [`IntoResponse`] impl.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Engine operation result type
pub type CoordResult<T> = Result<T, CoordError>;

/// Errors surfaced by the coordinator and task-runner engines
#[derive(Debug, Error)]
pub enum CoordError {
    /// A factory rejected the parameter bag. HTTP 400, no retry.
    #[error("invalid parameters for procedure {proc_name}: {reason}")]
    BadParams { proc_name: String, reason: String },

    /// No factory registered under the procedure name. HTTP 400, no retry.
    #[error("no factory registered for procedure {0}")]
    UnknownProc(String),

    /// A factory is already registered under the procedure name.
    #[error("a factory is already registered for procedure {0}")]
    AlreadyRegistered(String),

    /// The task runner is at its concurrency limit. HTTP 500; the
    /// coordinator treats this as a refusal and tries the next runner.
    #[error("task limit reached, max {0}")]
    AtCapacity(usize),

    /// The task id does not resolve. HTTP 404.
    #[error("no such task {0}")]
    TaskNotFound(String),

    /// The job id does not resolve. HTTP 404.
    #[error("no such job {0}")]
    JobNotFound(String),

    /// Delete was requested for a task that has not reached a terminal
    /// state. HTTP 500.
    #[error("task {0} is still running")]
    StillRunning(String),

    /// Every runner in the pool refused the task. Internal to dispatch;
    /// the job worker retries after its poll period.
    #[error("no runner accepted the task")]
    NoRunnerAccepted,

    /// The runner address is already in the pool. HTTP 500.
    #[error("runner {0} is already connected")]
    AlreadyConnected(String),

    /// The runner address is not in the pool. HTTP 500.
    #[error("runner {0} is not connected")]
    NotConnected(String),

    /// A freshly minted id collided with an existing record. Defensive;
    /// HTTP 500.
    #[error("duplicate id {0}")]
    IdDuplicate(String),
}

impl CoordError {
    /// Create a `BadParams` error for the given procedure.
    pub fn bad_params(proc_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BadParams {
            proc_name: proc_name.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CoordError::BadParams { .. } | CoordError::UnknownProc(_) => StatusCode::BAD_REQUEST,
            CoordError::TaskNotFound(_) | CoordError::JobNotFound(_) => StatusCode::NOT_FOUND,
            CoordError::AlreadyRegistered(_)
            | CoordError::AtCapacity(_)
            | CoordError::StillRunning(_)
            | CoordError::NoRunnerAccepted
            | CoordError::AlreadyConnected(_)
            | CoordError::NotConnected(_)
            | CoordError::IdDuplicate(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CoordError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
