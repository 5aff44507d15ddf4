//! Wait: sleep for a configurable number of seconds, or fail promptly on
//! cancellation.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use jobcoord_shared::error::{CoordError, CoordResult};
use jobcoord_shared::logging::EntityLogger;
use jobcoord_shared::types::{decode_params, TaskSpec};

use crate::task::{BoxedTask, ResultSink, Task, TerminalResult};

#[derive(Debug, Deserialize)]
struct WaitParams {
    #[serde(rename = "Sec")]
    sec: f64,
}

/// Sleeps `Sec` seconds and reports success; cancellation cuts the sleep
/// short and reports failure.
#[derive(Debug)]
pub struct WaitTask {
    duration: Duration,
}

impl WaitTask {
    pub fn factory(spec: &TaskSpec) -> CoordResult<BoxedTask> {
        let params: WaitParams = decode_params(spec)?;
        if !params.sec.is_finite() || params.sec < 0.0 {
            return Err(CoordError::bad_params(
                &spec.proc_name,
                format!("Sec must be a non-negative number, got {}", params.sec),
            ));
        }
        Ok(Box::new(Self {
            duration: Duration::from_secs_f64(params.sec),
        }))
    }
}

#[async_trait]
impl Task for WaitTask {
    async fn run(
        &self,
        cancel: CancellationToken,
        id: &str,
        logger: &EntityLogger,
        sink: ResultSink,
    ) {
        logger.log(format!("waiting {:?}", self.duration));
        tokio::select! {
            _ = tokio::time::sleep(self.duration) => {
                logger.log("wait complete");
                let _ = sink.send(TerminalResult::success(id)).await;
            }
            _ = cancel.cancelled() => {
                logger.log("wait cancelled");
                let _ = sink.send(TerminalResult::failure(id)).await;
            }
        }
    }
}
