//! # Log Plumbing
//!
//! Per-entity loggers for jobs and tasks. Every line is prefixed with
//! `[<id>]`, emitted to the process default sink through `tracing`, and
//! teed to an optional [`LogHandler`] so out-of-process sinks can key
//! entries by entity id.
//!
//! The subscriber installed by [`init_tracing`] is the default sink; the
//! engines never write to stderr directly, so the sink stays swappable.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

/// Marker line emitted exactly once per task, at the start of execution.
pub const TASK_START_MARKER: &str = "Start Task.";

/// Marker line emitted exactly once per job, at the start of execution.
pub const JOB_START_MARKER: &str = "Start Job.";

/// Receives every line an entity logger emits, tagged with the entity id.
///
/// Implementations must be safe to call concurrently; loggers for
/// different tasks share one handler and run on different workers. A
/// handler may forward entries to a message broker or other out-of-process
/// sink.
pub trait LogHandler: Send + Sync {
    fn handle_log(&self, id: &str, line: &[u8]);
}

/// Factory for per-entity loggers sharing one optional handler.
#[derive(Clone, Default)]
pub struct LogTee {
    handler: Option<Arc<dyn LogHandler>>,
}

impl LogTee {
    pub fn new(handler: Option<Arc<dyn LogHandler>>) -> Self {
        Self { handler }
    }

    /// Create a logger bound to one job or task id.
    pub fn entity(&self, id: impl Into<String>) -> EntityLogger {
        EntityLogger {
            id: id.into(),
            handler: self.handler.clone(),
        }
    }
}

/// Logger bound to a single job or task.
#[derive(Clone)]
pub struct EntityLogger {
    id: String,
    handler: Option<Arc<dyn LogHandler>>,
}

impl EntityLogger {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Emit one line: `[<id>] <message>` to the default sink, and the same
    /// bytes (newline-terminated) to the handler when one is configured.
    pub fn log(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        info!(target: "jobcoord", "[{}] {}", self.id, message);
        if let Some(handler) = &self.handler {
            let line = format!("[{}] {}\n", self.id, message);
            handler.handle_log(&self.id, line.as_bytes());
        }
    }
}

/// Install the process-wide tracing subscriber. Respects `RUST_LOG`;
/// defaults to `info`. Safe to call more than once (later calls no-op),
/// which keeps test binaries from fighting over the global subscriber.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHandler {
        lines: Mutex<Vec<(String, String)>>,
    }

    impl RecordingHandler {
        fn lines(&self) -> Vec<(String, String)> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl LogHandler for RecordingHandler {
        fn handle_log(&self, id: &str, line: &[u8]) {
            self.lines
                .lock()
                .unwrap()
                .push((id.to_string(), String::from_utf8_lossy(line).into_owned()));
        }
    }

    #[test]
    fn lines_are_prefixed_and_teed() {
        let handler = Arc::new(RecordingHandler::default());
        let tee = LogTee::new(Some(handler.clone()));
        let logger = tee.entity("task-1");

        logger.log("hello");

        let lines = handler.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, "task-1");
        assert_eq!(lines[0].1, "[task-1] hello\n");
    }

    #[test]
    fn start_markers_are_pattern_matchable() {
        let handler = Arc::new(RecordingHandler::default());
        let tee = LogTee::new(Some(handler.clone()));

        tee.entity("job-1").log(JOB_START_MARKER);
        tee.entity("task-1")
            .log(format!("{TASK_START_MARKER} ProcName:Echo"));

        let lines = handler.lines();
        assert!(lines[0].1.contains(JOB_START_MARKER));
        assert!(lines[1].1.contains(TASK_START_MARKER));
    }

    #[test]
    fn no_handler_means_default_sink_only() {
        let tee = LogTee::new(None);
        // Must not panic; output goes to the subscriber alone.
        tee.entity("task-2").log("quiet");
    }
}
