//! # Coordinator Engine
//!
//! Job registry, dispatch policy over the runner pool, and the periodic
//! liveness sweep. Dispatch is first-acceptance: walk the current pool
//! snapshot, skip addresses the job's filters exclude, hand the task to
//! the first runner that takes it. A refusal is a refusal — at capacity,
//! bad params and unreachable all read the same here.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use jobcoord_client::RunnerClient;
use jobcoord_shared::error::{CoordError, CoordResult};
use jobcoord_shared::logging::{LogHandler, LogTee};
use jobcoord_shared::types::{JobSpec, JobStatusResponse, TaskSpec};

use crate::job::{CoordinatorJob, Placement};
use crate::pool::RunnerPool;

/// Bounded timeout for each liveness probe so a hung runner cannot stall
/// the sweep.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Coordinator settings.
pub struct CoordinatorConfig {
    /// Optional sink for per-job log lines.
    pub handler: Option<Arc<dyn LogHandler>>,
    /// Period between a worker's dispatch retries and status polls.
    pub poll_period: Duration,
    /// Period between liveness sweeps of the runner pool.
    pub sweep_period: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            handler: None,
            poll_period: Duration::from_secs(30),
            sweep_period: Duration::from_secs(30),
        }
    }
}

/// Routes jobs across a dynamic pool of task runners.
pub struct Coordinator {
    jobs: DashMap<String, Arc<CoordinatorJob>>,
    pool: RunnerPool,
    http: reqwest::Client,
    probe_http: reqwest::Client,
    log: LogTee,
    poll_period: Duration,
    sweep_period: Duration,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        let probe_http = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "probe client build failed, probes will use the shared client");
                reqwest::Client::new()
            });
        Self {
            jobs: DashMap::new(),
            pool: RunnerPool::new(),
            http: reqwest::Client::new(),
            probe_http,
            log: LogTee::new(config.handler),
            poll_period: config.poll_period,
            sweep_period: config.sweep_period,
        }
    }

    /// Accept a job: mint an id, register the record and launch its
    /// workers. The id is returned immediately; the job runs concurrently.
    pub fn start(self: Arc<Self>, spec: JobSpec) -> CoordResult<String> {
        if spec.tasks.is_empty() {
            return Err(CoordError::bad_params("job", "tasks must not be empty"));
        }

        let id = Uuid::new_v4().to_string();
        let job = Arc::new(CoordinatorJob::new(
            &id,
            self.log.entity(&id),
            self.http.clone(),
            self.poll_period,
        ));

        use dashmap::mapref::entry::Entry;
        match self.jobs.entry(id.clone()) {
            Entry::Occupied(_) => return Err(CoordError::IdDuplicate(id)),
            Entry::Vacant(slot) => {
                slot.insert(job.clone());
            }
        }

        tokio::spawn(job.run(self, spec));

        Ok(id)
    }

    /// Fire a job's cancel signal.
    pub fn cancel(&self, job_id: &str) -> CoordResult<()> {
        self.job(job_id)?.cancel();
        Ok(())
    }

    /// Busy flag plus aggregated per-task statuses for a job.
    pub async fn status(&self, job_id: &str) -> CoordResult<JobStatusResponse> {
        let job = self.job(job_id)?;
        Ok(job.status().await)
    }

    /// Add a runner address to the pool.
    pub fn connect(&self, addr: &str) -> CoordResult<()> {
        self.pool.connect(addr)
    }

    /// Remove a runner address from the pool.
    pub fn disconnect(&self, addr: &str) -> CoordResult<()> {
        self.pool.disconnect(addr)
    }

    /// Current pool membership snapshot.
    pub fn runners(&self) -> Vec<String> {
        self.pool.list()
    }

    /// Ids of every accepted job, order unspecified.
    pub fn job_ids(&self) -> Vec<String> {
        self.jobs.iter().map(|e| e.key().clone()).collect()
    }

    /// Offer a task to the pool, first acceptance wins.
    ///
    /// When `filters` is present and non-empty, only addresses containing
    /// some filter as a substring are considered. No retries here — the
    /// job worker owns the retry loop.
    pub(crate) async fn start_task(
        &self,
        spec: &TaskSpec,
        filters: Option<&[String]>,
    ) -> CoordResult<Placement> {
        let filters = filters.filter(|f| !f.is_empty());

        for addr in self.pool.list() {
            if let Some(filters) = filters {
                if !filters.iter().any(|f| addr.contains(f.as_str())) {
                    continue;
                }
            }

            let client = RunnerClient::with_http(&addr, self.http.clone());
            match client.start(spec).await {
                Ok(task_id) => {
                    info!(runner = %addr, task_id = %task_id, "task placed");
                    return Ok(Placement {
                        runner_addr: addr,
                        task_id,
                    });
                }
                Err(err) => {
                    debug!(runner = %addr, error = %err, "runner refused task");
                }
            }
        }

        Err(CoordError::NoRunnerAccepted)
    }

    /// Drive the liveness sweep until `shutdown` fires. Missing a tick is
    /// acceptable; late sweeps are skipped rather than bunched.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.sweep_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.pool.probe(&self.probe_http).await,
                _ = shutdown.cancelled() => {
                    info!("stopping coordinator");
                    return;
                }
            }
        }
    }

    fn job(&self, job_id: &str) -> CoordResult<Arc<CoordinatorJob>> {
        self.jobs
            .get(job_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| CoordError::JobNotFound(job_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator() -> Arc<Coordinator> {
        Arc::new(Coordinator::new(CoordinatorConfig {
            handler: None,
            poll_period: Duration::from_millis(20),
            sweep_period: Duration::from_millis(20),
        }))
    }

    #[tokio::test]
    async fn empty_job_is_rejected() {
        let coordinator = coordinator();
        let err = coordinator
            .clone()
            .start(JobSpec {
                tasks: vec![],
                target_filters: None,
            })
            .unwrap_err();
        assert!(matches!(err, CoordError::BadParams { .. }));
        assert!(coordinator.job_ids().is_empty());
    }

    #[tokio::test]
    async fn unknown_job_operations_are_not_found() {
        let coordinator = coordinator();
        assert!(matches!(
            coordinator.cancel("missing").unwrap_err(),
            CoordError::JobNotFound(_)
        ));
        assert!(matches!(
            coordinator.status("missing").await.unwrap_err(),
            CoordError::JobNotFound(_)
        ));
    }

    #[tokio::test]
    async fn start_task_with_empty_pool_finds_no_runner() {
        let coordinator = coordinator();
        let err = coordinator
            .start_task(&TaskSpec::new("Echo"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoordError::NoRunnerAccepted));
    }

    #[tokio::test]
    async fn connect_delegates_to_the_pool() {
        let coordinator = coordinator();
        coordinator.connect("http://a:1").unwrap();
        assert!(matches!(
            coordinator.connect("http://a:1").unwrap_err(),
            CoordError::AlreadyConnected(_)
        ));
        assert_eq!(coordinator.runners(), vec!["http://a:1".to_string()]);
        coordinator.disconnect("http://a:1").unwrap();
        assert!(coordinator.runners().is_empty());
    }
}
