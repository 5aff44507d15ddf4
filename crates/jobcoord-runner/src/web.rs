//! # Task Runner HTTP API
//!
//! Thin translation of the engine's operations to request/response
//! shapes. All bodies are JSON; error status codes come from
//! [`CoordError`]'s `IntoResponse` impl.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use jobcoord_shared::error::CoordError;
use jobcoord_shared::types::{TaskListResponse, TaskSpec, TaskStartResponse, TaskStatusResponse};

use crate::engine::TaskRunner;

type RunnerState = Arc<TaskRunner>;

pub fn router(runner: Arc<TaskRunner>) -> Router {
    Router::new()
        .route("/start", post(start_task))
        .route("/cancel/{task_id}", post(cancel_task))
        .route("/status/{task_id}", get(task_status))
        .route("/delete/{task_id}", post(delete_task))
        .route("/alive", get(alive))
        .route("/tasks", get(list_tasks))
        .layer(TraceLayer::new_for_http())
        .with_state(runner)
}

/// POST /start — admit and launch a task.
async fn start_task(
    State(runner): State<RunnerState>,
    Json(spec): Json<TaskSpec>,
) -> Result<Json<TaskStartResponse>, CoordError> {
    let id = runner.start(spec)?;
    Ok(Json(TaskStartResponse { id }))
}

/// POST /cancel/:task_id — fire the task's cancel signal.
async fn cancel_task(
    State(runner): State<RunnerState>,
    Path(task_id): Path<String>,
) -> Result<StatusCode, CoordError> {
    runner.cancel(&task_id)?;
    Ok(StatusCode::OK)
}

/// GET /status/:task_id — spec, derived status and result values.
async fn task_status(
    State(runner): State<RunnerState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskStatusResponse>, CoordError> {
    Ok(Json(runner.status(&task_id)?))
}

/// POST /delete/:task_id — remove a terminal task.
async fn delete_task(
    State(runner): State<RunnerState>,
    Path(task_id): Path<String>,
) -> Result<StatusCode, CoordError> {
    runner.delete(&task_id)?;
    Ok(StatusCode::OK)
}

/// GET /alive — liveness probe.
async fn alive() -> StatusCode {
    StatusCode::OK
}

/// GET /tasks — registered task ids.
async fn list_tasks(State(runner): State<RunnerState>) -> Json<TaskListResponse> {
    Json(TaskListResponse {
        tasks: runner.task_ids(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TaskRunnerConfig;
    use crate::tasks;
    use axum::body::Body;
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    fn test_runner() -> (Router, CancellationToken) {
        let runner = Arc::new(TaskRunner::new(TaskRunnerConfig::default()));
        tasks::register_builtin(runner.registry()).unwrap();

        let shutdown = CancellationToken::new();
        let loop_runner = runner.clone();
        let loop_shutdown = shutdown.clone();
        tokio::spawn(async move { loop_runner.run(loop_shutdown).await });

        (router(runner), shutdown)
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn start_returns_an_id() {
        let (app, shutdown) = test_runner();

        let response = app
            .oneshot(json_request(
                "/start",
                json!({"procName": "Echo", "params": {"Value": "hello"}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));

        shutdown.cancel();
    }

    #[tokio::test]
    async fn wrong_content_type_is_unsupported_media_type() {
        let (app, shutdown) = test_runner();

        let request = Request::builder()
            .method("POST")
            .uri("/start")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("procName=Echo"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        shutdown.cancel();
    }

    #[tokio::test]
    async fn unknown_proc_is_bad_request() {
        let (app, shutdown) = test_runner();

        let response = app
            .oneshot(json_request("/start", json!({"procName": "Nope"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        shutdown.cancel();
    }

    #[tokio::test]
    async fn bad_params_is_bad_request() {
        let (app, shutdown) = test_runner();

        let response = app
            .oneshot(json_request(
                "/start",
                json!({"procName": "Wait", "params": {"Sec": "soon"}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        shutdown.cancel();
    }

    #[tokio::test]
    async fn status_of_unknown_task_is_not_found() {
        let (app, shutdown) = test_runner();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/status/does-not-exist")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        shutdown.cancel();
    }

    #[tokio::test]
    async fn cancel_of_unknown_task_is_not_found() {
        let (app, shutdown) = test_runner();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/cancel/does-not-exist")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        shutdown.cancel();
    }

    #[tokio::test]
    async fn alive_answers_ok() {
        let (app, shutdown) = test_runner();

        let response = app
            .oneshot(Request::builder().uri("/alive").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        shutdown.cancel();
    }

    #[tokio::test]
    async fn tasks_lists_started_ids() {
        let (app, shutdown) = test_runner();

        let response = app
            .clone()
            .oneshot(json_request(
                "/start",
                json!({"procName": "Wait", "params": {"Sec": 30.0}}),
            ))
            .await
            .unwrap();
        let id = body_json(response).await["id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(Request::builder().uri("/tasks").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        let tasks: Vec<String> = body["tasks"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect();
        assert!(tasks.contains(&id));

        shutdown.cancel();
    }
}
