//! # Task Capability Interface
//!
//! A task is polymorphic over a single capability: run under a
//! cancellation signal and deposit exactly one terminal result into the
//! engine's collection channel. The engine never inspects task internals.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use jobcoord_shared::logging::EntityLogger;
use jobcoord_shared::types::Params;

/// The terminal outcome of one task execution.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalResult {
    /// Id the engine assigned at admission; must match the id handed to
    /// `run`.
    pub id: String,
    pub success: bool,
    pub result_values: Option<Params>,
}

impl TerminalResult {
    pub fn success(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            success: true,
            result_values: None,
        }
    }

    pub fn failure(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            success: false,
            result_values: None,
        }
    }

    pub fn with_values(mut self, values: Params) -> Self {
        self.result_values = Some(values);
        self
    }
}

/// Sending half of the engine's result-collection channel.
pub type ResultSink = mpsc::Sender<TerminalResult>;

/// A unit of work parameterised at construction by its factory.
///
/// Contract, on every path out of `run`:
/// - deposit exactly one [`TerminalResult`] into `sink`, carrying the
///   supplied `id`;
/// - honor `cancel`: once it fires, stop as promptly as practical and
///   report `success = false`.
///
/// The engine supervises the spawned future; a panic before the result is
/// deposited is converted into a failure result on the task's behalf.
#[async_trait]
pub trait Task: Send + Sync + std::fmt::Debug {
    async fn run(
        &self,
        cancel: CancellationToken,
        id: &str,
        logger: &EntityLogger,
        sink: ResultSink,
    );
}

/// Owned task trait object, as returned by factories.
pub type BoxedTask = Box<dyn Task>;
