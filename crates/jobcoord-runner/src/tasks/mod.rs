//! # Built-in Tasks
//!
//! The two sample procedures every stock runner ships with. They double
//! as the reference implementations of the factory contract: decode the
//! parameter bag into a typed params struct, validate, and return a task
//! without starting any work.

mod echo;
mod wait;

pub use echo::EchoTask;
pub use wait::WaitTask;

use crate::registry::FactoryRegistry;
use jobcoord_shared::error::CoordResult;

/// Procedure name of the echo task.
pub const PROC_ECHO: &str = "Echo";

/// Procedure name of the wait task.
pub const PROC_WAIT: &str = "Wait";

/// Register the built-in procedures on a registry.
pub fn register_builtin(registry: &FactoryRegistry) -> CoordResult<()> {
    registry.add_factory(PROC_ECHO, EchoTask::factory)?;
    registry.add_factory(PROC_WAIT, WaitTask::factory)?;
    Ok(())
}
