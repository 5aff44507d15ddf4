//! # Coordinator Job
//!
//! A job is one worker per task, all sharing a single cancel signal. A
//! worker runs two phases: dispatch (retry until some runner accepts)
//! and monitor (poll the placement until it is terminal). Placements are
//! recorded append-only for the life of the job, and the job stays
//! queryable after completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use jobcoord_client::RunnerClient;
use jobcoord_shared::logging::{EntityLogger, JOB_START_MARKER};
use jobcoord_shared::types::{JobSpec, JobStatusResponse, TaskSpec};

use crate::engine::Coordinator;

/// Where one task ended up: the accepting runner and the id it minted.
#[derive(Debug, Clone)]
pub struct Placement {
    pub runner_addr: String,
    pub task_id: String,
}

/// One accepted job and its workers' shared state.
pub struct CoordinatorJob {
    id: String,
    placements: Mutex<Vec<Placement>>,
    cancel: CancellationToken,
    busy: AtomicBool,
    logger: EntityLogger,
    http: reqwest::Client,
    poll_period: Duration,
}

impl CoordinatorJob {
    pub(crate) fn new(
        id: impl Into<String>,
        logger: EntityLogger,
        http: reqwest::Client,
        poll_period: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            placements: Mutex::new(Vec::new()),
            cancel: CancellationToken::new(),
            busy: AtomicBool::new(false),
            logger,
            http,
            poll_period,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether any worker has not yet returned.
    pub fn busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Fire the shared cancel signal. Idempotent; a no-op once `run` has
    /// returned.
    pub fn cancel(&self) {
        self.cancel.cancel();
        info!(job_id = %self.id, "job cancellation requested");
    }

    /// Launch one worker per task and wait for all of them. Called exactly
    /// once, from the spawn in [`Coordinator::start`].
    pub(crate) async fn run(self: Arc<Self>, coordinator: Arc<Coordinator>, spec: JobSpec) {
        self.busy.store(true, Ordering::SeqCst);
        self.logger.log(JOB_START_MARKER);

        let mut workers = JoinSet::new();
        for task in spec.tasks {
            let job = self.clone();
            let coordinator = coordinator.clone();
            let filters = spec.target_filters.clone();
            workers.spawn(async move { job.run_task(coordinator, task, filters).await });
        }
        while workers.join_next().await.is_some() {}

        self.busy.store(false, Ordering::SeqCst);
        self.logger.log("Complete Job.");
    }

    /// Drive one task from dispatch to terminal.
    async fn run_task(
        &self,
        coordinator: Arc<Coordinator>,
        spec: TaskSpec,
        filters: Option<Vec<String>>,
    ) {
        // Phase 1: dispatch until some runner accepts. Cancellation here is
        // local; no placement is ever recorded.
        let placement = loop {
            self.logger
                .log(format!("dispatching task ProcName:{}", spec.proc_name));
            match coordinator.start_task(&spec, filters.as_deref()).await {
                Ok(placement) => break placement,
                Err(err) => {
                    debug!(job_id = %self.id, error = %err, "dispatch attempt failed, will retry");
                }
            }
            tokio::select! {
                _ = tokio::time::sleep(self.poll_period) => {}
                _ = self.cancel.cancelled() => return,
            }
        };

        self.logger.log(format!(
            "task {} started on {}",
            placement.task_id, placement.runner_addr
        ));
        self.placements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(placement.clone());

        // Phase 2: poll the placement until terminal. Cancellation here is
        // forwarded to the runner, best-effort, once.
        let client = RunnerClient::with_http(&placement.runner_addr, self.http.clone());
        loop {
            match client.status(&placement.task_id).await {
                Err(err) => {
                    self.logger.log(format!(
                        "status poll for task {} on {} failed: {}",
                        placement.task_id, placement.runner_addr, err
                    ));
                    return;
                }
                Ok(status) if status.status.is_terminal() => {
                    self.logger.log(format!(
                        "task {} on {} completed",
                        placement.task_id, placement.runner_addr
                    ));
                    return;
                }
                Ok(_) => {}
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_period) => {}
                _ = self.cancel.cancelled() => {
                    if let Err(err) = client.cancel(&placement.task_id).await {
                        self.logger.log(format!(
                            "cancel request for task {} on {} failed: {}",
                            placement.task_id, placement.runner_addr, err
                        ));
                    }
                    return;
                }
            }
        }
    }

    /// Busy flag plus the current status of every recorded placement.
    ///
    /// Placements are snapshotted under the lock; each status is then
    /// fetched independently, and fetch failures are logged and omitted,
    /// so the list may be shorter than the job's task count.
    pub async fn status(&self) -> JobStatusResponse {
        let placements = self
            .placements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut task_statuses = Vec::with_capacity(placements.len());
        for placement in &placements {
            let client = RunnerClient::with_http(&placement.runner_addr, self.http.clone());
            match client.status(&placement.task_id).await {
                Ok(status) => task_statuses.push(status),
                Err(err) => {
                    warn!(
                        job_id = %self.id,
                        runner = %placement.runner_addr,
                        task_id = %placement.task_id,
                        error = %err,
                        "task status fetch failed, omitting from job status"
                    );
                }
            }
        }

        JobStatusResponse {
            busy: self.busy(),
            task_statuses,
        }
    }
}
