//! # jobcoord-coordinator
//!
//! The coordinator accepts jobs, fans each task out to whichever runner
//! in the pool accepts it first, polls placements until they are
//! terminal, forwards cancellation, aggregates per-task status into job
//! status, and sweeps dead runners out of the pool.

pub mod engine;
pub mod job;
pub mod pool;
pub mod web;

pub use engine::{Coordinator, CoordinatorConfig};
pub use job::CoordinatorJob;
pub use pool::RunnerPool;
