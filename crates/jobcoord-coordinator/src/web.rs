//! # Coordinator HTTP API

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use jobcoord_shared::error::CoordError;
use jobcoord_shared::types::{
    ConnectionRequest, JobListResponse, JobSpec, JobStartResponse, JobStatusResponse,
    RunnerListResponse,
};

use crate::engine::Coordinator;

type CoordinatorState = Arc<Coordinator>;

pub fn router(coordinator: Arc<Coordinator>) -> Router {
    Router::new()
        .route("/start", post(start_job))
        .route("/cancel/{job_id}", post(cancel_job))
        .route("/status/{job_id}", get(job_status))
        .route("/connect", post(connect_runner))
        .route("/disconnect", post(disconnect_runner))
        .route("/runners", get(list_runners))
        .route("/jobs", get(list_jobs))
        .layer(TraceLayer::new_for_http())
        .with_state(coordinator)
}

/// POST /start — accept a job.
async fn start_job(
    State(coordinator): State<CoordinatorState>,
    Json(spec): Json<JobSpec>,
) -> Result<Json<JobStartResponse>, CoordError> {
    let id = coordinator.start(spec)?;
    Ok(Json(JobStartResponse { id }))
}

/// POST /cancel/:job_id — fire the job's cancel signal.
async fn cancel_job(
    State(coordinator): State<CoordinatorState>,
    Path(job_id): Path<String>,
) -> Result<StatusCode, CoordError> {
    coordinator.cancel(&job_id)?;
    Ok(StatusCode::OK)
}

/// GET /status/:job_id — busy flag plus aggregated task statuses.
async fn job_status(
    State(coordinator): State<CoordinatorState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusResponse>, CoordError> {
    Ok(Json(coordinator.status(&job_id).await?))
}

/// POST /connect — add a runner to the pool.
async fn connect_runner(
    State(coordinator): State<CoordinatorState>,
    Json(request): Json<ConnectionRequest>,
) -> Result<StatusCode, CoordError> {
    coordinator.connect(&request.address)?;
    Ok(StatusCode::OK)
}

/// POST /disconnect — remove a runner from the pool.
async fn disconnect_runner(
    State(coordinator): State<CoordinatorState>,
    Json(request): Json<ConnectionRequest>,
) -> Result<StatusCode, CoordError> {
    coordinator.disconnect(&request.address)?;
    Ok(StatusCode::OK)
}

/// GET /runners — pool membership snapshot.
async fn list_runners(State(coordinator): State<CoordinatorState>) -> Json<RunnerListResponse> {
    Json(RunnerListResponse {
        runners: coordinator.runners(),
    })
}

/// GET /jobs — ids of every accepted job.
async fn list_jobs(State(coordinator): State<CoordinatorState>) -> Json<JobListResponse> {
    Json(JobListResponse {
        jobs: coordinator.job_ids(),
    })
}
