//! # TaskRunner Engine
//!
//! Admission-controlled registry of running tasks plus the
//! result-collection loop.
//!
//! Admission and the active-task count serialise through one mutex: a
//! start checks capacity, installs the record and increments the count in
//! a single critical section, and the collection loop decrements under
//! the same lock, so two simultaneous starts at capacity can never both
//! succeed and the count always equals the number of registered
//! non-terminal records.

use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use jobcoord_shared::error::{CoordError, CoordResult};
use jobcoord_shared::logging::{EntityLogger, LogHandler, LogTee, TASK_START_MARKER};
use jobcoord_shared::types::{TaskSpec, TaskStatus, TaskStatusResponse};

use crate::registry::FactoryRegistry;
use crate::task::{BoxedTask, TerminalResult};

/// Task runner settings.
pub struct TaskRunnerConfig {
    /// Maximum number of concurrently running tasks.
    pub max_tasks: usize,
    /// Optional sink for per-task log lines.
    pub handler: Option<Arc<dyn LogHandler>>,
}

impl Default for TaskRunnerConfig {
    fn default() -> Self {
        Self {
            max_tasks: 10,
            handler: None,
        }
    }
}

/// One registered task: the spec as received, its cancel signal, and the
/// terminal result once the collection loop has recorded it.
struct TaskRecord {
    spec: TaskSpec,
    cancel: CancellationToken,
    result: Option<TerminalResult>,
}

/// Bounded-concurrency task execution engine.
pub struct TaskRunner {
    max_tasks: usize,
    registry: FactoryRegistry,
    tasks: DashMap<String, TaskRecord>,
    active: Mutex<usize>,
    sink: mpsc::Sender<TerminalResult>,
    results: Mutex<Option<mpsc::Receiver<TerminalResult>>>,
    log: LogTee,
}

impl TaskRunner {
    pub fn new(config: TaskRunnerConfig) -> Self {
        let (sink, results) = mpsc::channel(config.max_tasks.max(1));
        Self {
            max_tasks: config.max_tasks,
            registry: FactoryRegistry::new(),
            tasks: DashMap::new(),
            active: Mutex::new(0),
            sink,
            results: Mutex::new(Some(results)),
            log: LogTee::new(config.handler),
        }
    }

    /// The factory registry; register procedures here before serving.
    pub fn registry(&self) -> &FactoryRegistry {
        &self.registry
    }

    /// Number of registered, non-terminal tasks.
    pub fn active_tasks(&self) -> usize {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit and launch a task.
    ///
    /// Fails with `AtCapacity` when `max_tasks` tasks are already running,
    /// and with `UnknownProc`/`BadParams` when construction fails; neither
    /// failure commits any state.
    pub fn start(&self, spec: TaskSpec) -> CoordResult<String> {
        // Capacity check, record install and increment share one critical
        // section; the collection loop decrements under the same lock.
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if *active >= self.max_tasks {
            return Err(CoordError::AtCapacity(self.max_tasks));
        }

        let task = self.registry.construct(&spec)?;

        let id = Uuid::new_v4().to_string();
        let cancel = CancellationToken::new();
        self.tasks.insert(
            id.clone(),
            TaskRecord {
                spec: spec.clone(),
                cancel: cancel.clone(),
                result: None,
            },
        );
        *active += 1;
        drop(active);

        let logger = self.log.entity(&id);
        logger.log(format!(
            "{TASK_START_MARKER} ProcName:{} Params:{:?}",
            spec.proc_name, spec.params
        ));
        self.spawn_task(task, cancel, id.clone(), logger);

        Ok(id)
    }

    /// Fire a task's cancel signal. Idempotent: cancelling a terminal or
    /// already-cancelled task is a no-op success.
    pub fn cancel(&self, task_id: &str) -> CoordResult<()> {
        let record = self
            .tasks
            .get(task_id)
            .ok_or_else(|| CoordError::TaskNotFound(task_id.to_string()))?;
        record.cancel.cancel();
        Ok(())
    }

    /// Current status of a task, with the original spec echoed back.
    pub fn status(&self, task_id: &str) -> CoordResult<TaskStatusResponse> {
        let record = self
            .tasks
            .get(task_id)
            .ok_or_else(|| CoordError::TaskNotFound(task_id.to_string()))?;

        let (status, result_values) = match &record.result {
            None => (TaskStatus::Busy, None),
            Some(result) if result.success => (TaskStatus::Success, result.result_values.clone()),
            Some(result) => (TaskStatus::Failure, result.result_values.clone()),
        };

        Ok(TaskStatusResponse {
            spec: record.spec.clone(),
            status,
            result_values,
        })
    }

    /// Remove a terminal task from the registry. Fails with
    /// `StillRunning` while the result is absent.
    pub fn delete(&self, task_id: &str) -> CoordResult<()> {
        if self
            .tasks
            .remove_if(task_id, |_, record| record.result.is_some())
            .is_some()
        {
            return Ok(());
        }
        if self.tasks.contains_key(task_id) {
            Err(CoordError::StillRunning(task_id.to_string()))
        } else {
            Err(CoordError::TaskNotFound(task_id.to_string()))
        }
    }

    /// Ids of every registered task. Non-atomic snapshot, order
    /// unspecified.
    pub fn task_ids(&self) -> Vec<String> {
        self.tasks.iter().map(|e| e.key().clone()).collect()
    }

    /// Drive the result-collection loop until `shutdown` fires.
    ///
    /// The loop is the sole writer of task results and of the active-count
    /// decrement. Call exactly once; a second call returns immediately.
    pub async fn run(&self, shutdown: CancellationToken) {
        let receiver = self
            .results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut results) = receiver else {
            warn!("collection loop is already running");
            return;
        };

        loop {
            tokio::select! {
                received = results.recv() => {
                    match received {
                        Some(result) => self.record_result(result),
                        None => break,
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("stopping task runner");
                    break;
                }
            }
        }
    }

    fn spawn_task(
        &self,
        task: BoxedTask,
        cancel: CancellationToken,
        id: String,
        logger: EntityLogger,
    ) {
        let sink = self.sink.clone();
        let supervisor_sink = self.sink.clone();
        let task_id = id.clone();
        let handle = tokio::spawn(async move {
            task.run(cancel, &task_id, &logger, sink).await;
        });
        // Supervisor: a task that panics out of run still owes the channel
        // its terminal result.
        tokio::spawn(async move {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    warn!(task_id = %id, "task panicked before completing, recording failure");
                    let _ = supervisor_sink.send(TerminalResult::failure(id)).await;
                }
            }
        });
    }

    fn record_result(&self, result: TerminalResult) {
        let logger = self.log.entity(&result.id);
        logger.log(format!(
            "Complete Task. Success:{} ResultValues:{:?}",
            result.success, result.result_values
        ));

        {
            let Some(mut record) = self.tasks.get_mut(&result.id) else {
                warn!(task_id = %result.id, "received result for unknown task");
                return;
            };
            if record.result.is_some() {
                warn!(task_id = %result.id, "duplicate terminal result ignored");
                return;
            }
            record.result = Some(result);
            // Guard dropped here: the active lock is taken only after the
            // shard lock is released, matching start's lock order.
        }

        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        *active = active.saturating_sub(1);
    }
}
