//! Echo: log the supplied value and succeed immediately.

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use jobcoord_shared::error::CoordResult;
use jobcoord_shared::logging::EntityLogger;
use jobcoord_shared::types::{decode_params, TaskSpec};

use crate::task::{BoxedTask, ResultSink, Task, TerminalResult};

#[derive(Debug, Deserialize)]
struct EchoParams {
    #[serde(rename = "Value")]
    value: String,
}

/// Logs its `Value` parameter and reports success.
#[derive(Debug)]
pub struct EchoTask {
    value: String,
}

impl EchoTask {
    pub fn factory(spec: &TaskSpec) -> CoordResult<BoxedTask> {
        let params: EchoParams = decode_params(spec)?;
        Ok(Box::new(Self {
            value: params.value,
        }))
    }
}

#[async_trait]
impl Task for EchoTask {
    async fn run(
        &self,
        _cancel: CancellationToken,
        id: &str,
        logger: &EntityLogger,
        sink: ResultSink,
    ) {
        logger.log(format!("Echo: {}", self.value));
        let _ = sink.send(TerminalResult::success(id)).await;
    }
}
